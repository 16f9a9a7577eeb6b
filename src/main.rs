//! # rootsift
//!
//! A command-line tool for turning ROOT event files from CMS, ATLAS and
//! ALICE into compact, ranked JSON documents.
//!
//! ## Usage
//!
//! ```bash
//! # One file, written to processed/<stem>.json next to the input
//! rootsift process nanoaod.root
//!
//! # Several files on four workers, exact top-K
//! rootsift process run1.root run2.root -j 4 --exact
//!
//! # Every .root file of a folder merged into one document
//! rootsift merge data/ --max-events 2000
//!
//! # What would be read, without processing
//! rootsift inspect mini.root
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
