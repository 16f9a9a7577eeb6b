//! # rootsift - ROOT Event Extraction for Visualization
//!
//! `rootsift` turns particle-physics event files (ROOT TTrees) from CMS, ATLAS
//! and ALICE into compact, pre-filtered, ranked JSON documents that a browser
//! can draw directly.
//!
//! ## Key Features
//!
//! - **Experiment Detection**: Recognises NanoAOD, ATLAS open-data ntuples and
//!   ALICE ESD/AOD trees from their tree and branch names, and says how sure
//!   it is.
//!
//! - **Partial Schemas**: Only the branches a file actually carries are read;
//!   particle kinds without a direction are dropped up front.
//!
//! - **Bounded Memory**: Trees are streamed in fixed-size chunks with
//!   awkward-style ragged columns, one chunk in memory at a time.
//!
//! - **Vectorised Physics**: HT, leading-lepton pT, b-jet counts, missing
//!   energy and Lorentz four-vectors per particle.
//!
//! - **Ranking**: Events passing the experiment's cuts are ranked by HT and
//!   capped, per file or across a whole folder.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rootsift::output::OutputDocument;
//! use rootsift::processor::{EventProcessor, ProcessorConfig};
//!
//! let processor = EventProcessor::with_config(ProcessorConfig::default().with_max_events(500));
//! let processed = processor.process_file("nanoaod.root")?;
//!
//! let document = OutputDocument::from(processed);
//! document.write_to("processed/nanoaod.json")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Output Document
//!
//! ```text
//! {
//!   "metadata": { "source_file", "tree_name", "experiment", "total_scanned",
//!                 "filtered_events", "ht_distribution", ... },
//!   "events":   [ { "index", "experiment", "ht", "met", "leading_lepton_pt",
//!                   "particles": [ { "type", "color", "pt", "eta", "phi",
//!                                    "mass", "px", "py", "pz", "energy" } ],
//!                   "met_vector": { "pt", "phi" } } ]
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`schema`]: Static per-experiment profiles and per-file branch resolution
//! - [`reader`]: Tree access traits, the ROOT reader and chunked columns
//! - [`detector`]: Experiment auto-detection
//! - [`physics`]: Four-vector derivation
//! - [`processor`]: The single-file pipeline
//! - [`ranking`]: HT ordering and bounded accumulation
//! - [`batch`]: Multi-file processing and folder merge
//! - [`summary`]: Processing metadata and distributions
//! - [`output`]: The two-key JSON document

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod batch;
pub mod detector;
pub mod event;
pub mod output;
pub mod physics;
pub mod processor;
pub mod ranking;
pub mod reader;
pub mod schema;
pub mod summary;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::batch::{
        BatchConfig, BatchError, BatchProcessor, BatchReport, FileOutcome, JobStatus, MergedOutput,
    };
    pub use crate::detector::{detect, Confidence, Detection};
    pub use crate::event::{EventRecord, MetVector, Particle};
    pub use crate::output::{OutputDocument, OutputError};
    pub use crate::physics::FourVector;
    pub use crate::processor::{
        EventProcessor, ProcessError, ProcessedFile, ProcessorConfig, ScanMode,
    };
    pub use crate::reader::{DataFile, EventTree, MemoryFile, MemoryTree, ReaderError, RootFile};
    pub use crate::schema::{Experiment, ExperimentSelector, ParticleKind, ResolvedSchema};
    pub use crate::summary::ProcessingSummary;
}
