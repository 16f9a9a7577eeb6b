//! # Event Processor
//!
//! The single-file pipeline:
//!
//! 1. pick the experiment and tree ([`crate::detector`])
//! 2. resolve the branches the tree actually has ([`ResolvedSchema`])
//! 3. stream the tree chunk by chunk in file order, deriving event
//!    quantities, applying the profile's selection and building records
//!    ([`ChunkProcessor`])
//! 4. rank by HT and cap ([`EventAccumulator`])
//! 5. summarise ([`ProcessingSummary`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use rootsift::processor::{EventProcessor, ProcessorConfig};
//!
//! let processor = EventProcessor::with_config(ProcessorConfig::default().with_max_events(100));
//! let processed = processor.process_file("nanoaod.root")?;
//! println!("{}", processed.summary);
//! # Ok::<(), rootsift::processor::ProcessError>(())
//! ```

mod chunk;
mod error;
mod selection;


use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;

use log::{debug, info, warn};

use crate::detector;
use crate::event::EventRecord;
use crate::ranking::EventAccumulator;
use crate::reader::{ChunkStream, DataFile, EventTree, ReaderError, RootFile};
use crate::schema::{ExperimentSelector, ResolvedSchema};
use crate::summary::ProcessingSummary;

pub use crate::ranking::ScanMode;
pub use chunk::{ChunkProcessor, DerivedColumns};
pub use error::ProcessError;
pub use selection::{selection_mask, Criterion};

/// Default number of events per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 50_000;

/// Default cap on output events
pub const DEFAULT_MAX_EVENTS: usize = 5_000;

/// Configuration for processing one file
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorConfig {
    /// Events read per chunk
    pub chunk_size: usize,

    /// Cap on output events
    pub max_events: usize,

    /// Auto-detect or force the experiment
    pub experiment: ExperimentSelector,

    /// Stop early at twice the cap, or read to completion
    pub scan_mode: ScanMode,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_events: DEFAULT_MAX_EVENTS,
            experiment: ExperimentSelector::Auto,
            scan_mode: ScanMode::Bounded,
        }
    }
}

impl ProcessorConfig {
    /// Read every event; exact top-K.
    pub fn exact() -> Self {
        Self {
            scan_mode: ScanMode::Exact,
            ..Self::default()
        }
    }

    /// Set chunk size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set output cap
    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    /// Set experiment selector
    pub fn with_experiment(mut self, experiment: ExperimentSelector) -> Self {
        self.experiment = experiment;
        self
    }

    /// Set scan mode
    pub fn with_scan_mode(mut self, scan_mode: ScanMode) -> Self {
        self.scan_mode = scan_mode;
        self
    }

    /// Reject settings that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), ProcessError> {
        if self.chunk_size == 0 {
            return Err(ProcessError::InvalidConfig(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.max_events == 0 {
            return Err(ProcessError::InvalidConfig(
                "max_events must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ranked events of one file plus its summary
#[derive(Debug, Clone)]
pub struct ProcessedFile {
    /// Passing events, HT descending, capped
    pub events: Vec<EventRecord>,
    /// Provenance and statistics
    pub summary: ProcessingSummary,
}

/// Runs the single-file pipeline
#[derive(Debug, Clone, Default)]
pub struct EventProcessor {
    config: ProcessorConfig,
}

impl EventProcessor {
    /// Create a processor with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a processor with custom configuration
    pub fn with_config(config: ProcessorConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Process a ROOT file on disk.
    ///
    /// Decoder panics on malformed payloads are turned into
    /// [`ProcessError::DecoderPanic`].
    pub fn process_file<P: AsRef<Path>>(&self, path: P) -> Result<ProcessedFile, ProcessError> {
        let path = path.as_ref();
        self.config.validate()?;
        if !path.exists() {
            return Err(ProcessError::FileNotFound(path.to_path_buf()));
        }

        let label = path.display().to_string();
        catch_decoder_panic(|| {
            let mut file = RootFile::open(path).map_err(|err| ProcessError::NotRootFile {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;
            self.process_source(&mut file, &label)
        })
    }

    /// Process any [`DataFile`]; `source` labels it in the summary.
    pub fn process_source<F: DataFile>(
        &self,
        file: &mut F,
        source: &str,
    ) -> Result<ProcessedFile, ProcessError> {
        self.config.validate()?;
        let started = Instant::now();

        let detection = detector::select(file, self.config.experiment)
            .map_err(|err| ProcessError::from_detect(source, err))?;
        info!("{}: {}", source, detection);

        let mut warnings = Vec::new();
        if detection.is_low_confidence() {
            warnings.push(format!(
                "Experiment not recognised; assuming {}",
                detection.experiment
            ));
        }

        let tree = file.open_tree(&detection.tree_name)?;
        let mut schema = ResolvedSchema::for_tree(detection.experiment.profile(), &tree);
        let mut accumulator = EventAccumulator::new(self.config.max_events, self.config.scan_mode);
        let mut scanned = 0u64;
        let mut early_terminated = false;

        match open_stream(&tree, &mut schema, self.config.chunk_size, &mut warnings)? {
            None => {
                // The tree was read; its entries count as scanned.
                scanned = tree.num_entries();
                warn!(
                    "{}: no usable branches in tree '{}'",
                    source, detection.tree_name
                );
                warnings.push(format!(
                    "No usable branches in tree '{}'",
                    detection.tree_name
                ));
            }
            Some(mut stream) => {
                let total = stream.total_entries();
                let processor = ChunkProcessor::new(&schema);
                while let Some(chunk) = stream.next() {
                    let mut chunk = chunk?;
                    processor.prepare(&mut chunk);
                    let passing = processor.process(&chunk, chunk.start);
                    debug!(
                        "Chunk at {}: {} of {} events pass",
                        chunk.start,
                        passing.len(),
                        chunk.len
                    );
                    accumulator.extend(passing);
                    scanned = stream.consumed();
                    info!(
                        "{}: scanned {}/{} events, {} passing",
                        source,
                        scanned,
                        total,
                        accumulator.collected()
                    );
                    if accumulator.is_saturated() {
                        early_terminated = scanned < total;
                        break;
                    }
                }
            }
        }

        let events = accumulator.finish();
        let mut summary = ProcessingSummary::new(source, detection.tree_name.clone())
            .with_particle_types(schema.kinds())
            .with_events(&events)
            .with_timing(scanned, started.elapsed());
        summary.experiment = detection.experiment.tag().to_string();
        summary.detection = detection.confidence.label().to_string();
        summary.scan_mode = self.config.scan_mode;
        summary.early_terminated = early_terminated;
        summary.warnings = warnings;

        info!("{}", summary);
        Ok(ProcessedFile { events, summary })
    }
}

/// Open a chunk stream, dropping branches whose type cannot be decoded.
///
/// Returns `None` when nothing usable is left.
fn open_stream<'t, T: EventTree>(
    tree: &'t T,
    schema: &mut ResolvedSchema,
    chunk_size: usize,
    warnings: &mut Vec<String>,
) -> Result<Option<ChunkStream<'t>>, ReaderError> {
    loop {
        if schema.is_empty() {
            return Ok(None);
        }
        match tree.chunks(&schema.columns(), chunk_size) {
            Ok(stream) => return Ok(Some(stream)),
            Err(ReaderError::UnsupportedType { branch, type_name }) => {
                warn!("Ignoring branch '{}' of type '{}'", branch, type_name);
                warnings.push(format!("Unsupported branch '{branch}' ({type_name}) ignored"));
                schema.drop_branch(&branch);
            }
            Err(err) => return Err(err),
        }
    }
}

/// Run `f`, turning a panic into [`ProcessError::DecoderPanic`].
pub(crate) fn catch_decoder_panic<T>(
    f: impl FnOnce() -> Result<T, ProcessError>,
) -> Result<T, ProcessError> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(ProcessError::DecoderPanic(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
