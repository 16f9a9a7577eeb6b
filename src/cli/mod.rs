use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use rootsift::batch::{default_workers, BatchConfig, DEFAULT_EXTENSION};
use rootsift::processor::{ProcessorConfig, ScanMode, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_EVENTS};
use rootsift::schema::{Experiment, ExperimentSelector};

mod inspect;
mod merge;
mod process;

mod config;

pub use config::Config;

/// rootsift - Multi-experiment ROOT event extraction
#[derive(Parser)]
#[command(name = "rootsift")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Experiment selection on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ExperimentArg {
    /// Detect from tree and branch names
    #[default]
    Auto,
    /// CMS NanoAOD
    Cms,
    /// ATLAS open-data ntuples
    Atlas,
    /// ALICE ESD/AOD trees
    Alice,
}

impl From<ExperimentArg> for ExperimentSelector {
    fn from(arg: ExperimentArg) -> Self {
        match arg {
            ExperimentArg::Auto => ExperimentSelector::Auto,
            ExperimentArg::Cms => ExperimentSelector::Forced(Experiment::Cms),
            ExperimentArg::Atlas => ExperimentSelector::Forced(Experiment::Atlas),
            ExperimentArg::Alice => ExperimentSelector::Forced(Experiment::Alice),
        }
    }
}

/// Flags shared by `process` and `merge`.
#[derive(Args, Debug, Default)]
pub struct ProcessingArgs {
    /// Events read per chunk [default: 50000]
    #[arg(short = 'c', long)]
    chunk_size: Option<usize>,

    /// Maximum events in each output document [default: 5000]
    #[arg(short = 'n', long)]
    max_events: Option<usize>,

    /// Experiment (auto, cms, atlas, alice) [default: auto]
    #[arg(short = 'e', long, value_enum, ignore_case = true)]
    experiment: Option<ExperimentArg>,

    /// Read every event for an exact top-K instead of stopping early
    #[arg(long)]
    exact: bool,

    /// Output directory [default: processed/ next to the input]
    #[arg(short = 'o', long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Files processed concurrently [default: available cores, at most 4]
    #[arg(short = 'j', long)]
    workers: Option<usize>,

    /// Print the document to stdout instead of writing a file
    #[arg(long)]
    stdout: bool,
}

impl ProcessingArgs {
    /// Combine flags, config file values and defaults, in that order.
    pub fn resolve(&self, config: &Config) -> Result<BatchConfig> {
        let file = &config.processing;

        let experiment = match (self.experiment, file.experiment.as_deref()) {
            (Some(arg), _) => ExperimentSelector::from(arg),
            (None, Some(name)) => name
                .parse::<ExperimentSelector>()
                .context("Invalid experiment in config file")?,
            (None, None) => ExperimentSelector::Auto,
        };
        let scan_mode = if self.exact || file.exact.unwrap_or(false) {
            ScanMode::Exact
        } else {
            ScanMode::Bounded
        };

        let processor = ProcessorConfig::default()
            .with_chunk_size(self.chunk_size.or(file.chunk_size).unwrap_or(DEFAULT_CHUNK_SIZE))
            .with_max_events(self.max_events.or(file.max_events).unwrap_or(DEFAULT_MAX_EVENTS))
            .with_experiment(experiment)
            .with_scan_mode(scan_mode);
        processor.validate()?;

        let mut batch = BatchConfig::default()
            .with_processor(processor)
            .with_workers(self.workers.or(file.workers).unwrap_or_else(default_workers));
        if let Some(dir) = self.output_dir.clone().or_else(|| file.output_dir.clone()) {
            batch = batch.with_output_dir(dir);
        }
        Ok(batch)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Process ROOT files into ranked JSON event documents
    Process {
        /// Input ROOT files
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        args: ProcessingArgs,
    },

    /// Process every file of a folder into one merged document
    Merge {
        /// Folder holding the input files
        #[arg(value_name = "FOLDER")]
        folder: PathBuf,

        /// Extension of the files to pick up
        #[arg(long, default_value = DEFAULT_EXTENSION)]
        extension: String,

        #[command(flatten)]
        args: ProcessingArgs,
    },

    /// Show trees, the detected experiment and the resolved branches
    Inspect {
        /// Input ROOT file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Experiment (auto, cms, atlas, alice)
        #[arg(short = 'e', long, value_enum, ignore_case = true, default_value = "auto")]
        experiment: ExperimentArg,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Process { files, args } => {
            process::run(files, args.resolve(&config)?, args.stdout)
        }
        Commands::Merge {
            folder,
            extension,
            args,
        } => merge::run(folder, &extension, args.resolve(&config)?, args.stdout),
        Commands::Inspect { file, experiment } => inspect::run(file, experiment.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_process_flags() {
        let cli = parse(&[
            "rootsift", "-vv", "process", "a.root", "b.root", "-n", "10", "--exact", "-e", "ATLAS",
        ]);
        assert_eq!(cli.verbosity(), 2);
        let Commands::Process { files, args } = cli.command else {
            panic!("expected process");
        };
        assert_eq!(files.len(), 2);

        let batch = args.resolve(&Config::default()).unwrap();
        assert_eq!(batch.processor.max_events, 10);
        assert_eq!(batch.processor.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(batch.processor.scan_mode, ScanMode::Exact);
        assert_eq!(
            batch.processor.experiment,
            ExperimentSelector::Forced(Experiment::Atlas)
        );
        assert!(batch.output_dir.is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let config = Config::from_str(
            "[processing]\nmax_events = 7\nchunk_size = 1000\nexperiment = \"alice\"\nworkers = 3\n",
        )
        .unwrap();

        let args = ProcessingArgs {
            max_events: Some(20),
            ..Default::default()
        };
        let batch = args.resolve(&config).unwrap();
        assert_eq!(batch.processor.max_events, 20);
        assert_eq!(batch.processor.chunk_size, 1000);
        assert_eq!(
            batch.processor.experiment,
            ExperimentSelector::Forced(Experiment::Alice)
        );
        assert_eq!(batch.workers, 3);
    }

    #[test]
    fn test_bad_experiment_fails_fast() {
        assert!(Cli::try_parse_from(["rootsift", "process", "a.root", "-e", "lhcb"]).is_err());

        let config = Config::from_str("[processing]\nexperiment = \"lhcb\"\n").unwrap();
        assert!(ProcessingArgs::default().resolve(&config).is_err());
    }

    #[test]
    fn test_zero_max_events_rejected() {
        let args = ProcessingArgs {
            max_events: Some(0),
            ..Default::default()
        };
        assert!(args.resolve(&Config::default()).is_err());
    }

    #[test]
    fn test_merge_defaults() {
        let cli = parse(&["rootsift", "merge", "data/"]);
        let Commands::Merge { extension, .. } = cli.command else {
            panic!("expected merge");
        };
        assert_eq!(extension, "root");
    }

    #[test]
    fn test_process_requires_files() {
        assert!(Cli::try_parse_from(["rootsift", "process"]).is_err());
    }
}
