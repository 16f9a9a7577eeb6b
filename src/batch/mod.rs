//! # Batch Processing
//!
//! Runs the single-file pipeline over many inputs. Files are processed
//! independently, in parallel across a dedicated worker pool when the
//! `parallel` feature is on, and every failure stays local to its file.
//!
//! - [`BatchProcessor::process_many`] writes one document per input and
//!   returns a [`BatchReport`] with one [`FileOutcome`] per path.
//! - [`BatchProcessor::process_folder`] merges every file of a folder into a
//!   single ranked document (see [`merge`]).
//!
//! Progress is published as [`JobStatus`] messages on an optional channel.
//! Setting the cancellation flag stops files that have not started yet;
//! running files finish normally.

mod merge;


use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use log::{info, warn};

use crate::output::{default_output_path, OutputDocument};
use crate::processor::{EventProcessor, ProcessError, ProcessedFile, ProcessorConfig};

pub use merge::{list_inputs, merge, MergedOutput, DEFAULT_EXTENSION};

/// Errors that abort a whole batch
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// No input path points at an existing file
    #[error("No input files to process")]
    NoInputFiles,

    /// Folder mode was given something that is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// I/O error while listing inputs
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The worker pool could not be created
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    /// Invalid processor configuration
    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Progress messages for an external status registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// A file started
    Processing {
        /// Input path
        file: PathBuf,
        /// 1-based position among started files
        current: usize,
        /// Files in the batch
        total: usize,
    },
    /// A file finished
    Processed {
        /// Input path
        file: PathBuf,
        /// Events retained
        events: usize,
    },
    /// A file failed
    Failed {
        /// Input path
        file: PathBuf,
        /// Error message
        error: String,
    },
    /// A file was not started because the batch was cancelled
    Skipped {
        /// Input path
        file: PathBuf,
    },
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Processing {
                file,
                current,
                total,
            } => write!(f, "processing {} of {}: {}", current, total, file.display()),
            JobStatus::Processed { file, events } => {
                write!(f, "processed: {} ({} events)", file.display(), events)
            }
            JobStatus::Failed { file, error } => {
                write!(f, "error: {}: {}", file.display(), error)
            }
            JobStatus::Skipped { file } => write!(f, "skipped: {}", file.display()),
        }
    }
}

/// Result of running the pipeline on one input
#[derive(Debug)]
pub enum FileResult {
    /// Events and summary
    Processed(ProcessedFile),
    /// The file could not be processed
    Failed(ProcessError),
    /// Cancelled before it started
    Skipped,
}

/// Per-file entry of a [`BatchReport`]
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Processed; `output` is where the document was written, if anywhere
    Processed {
        /// Written document
        output: Option<PathBuf>,
        /// Events retained
        events: usize,
        /// Events scanned
        scanned: u64,
    },
    /// Failed with this message
    Failed(String),
    /// Cancelled before it started
    Skipped,
}

/// Outcome of every input of a batch, keyed by path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Outcome per input path
    pub outcomes: BTreeMap<PathBuf, FileOutcome>,
}

impl BatchReport {
    /// Files that produced a document
    pub fn processed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Processed { .. }))
    }

    /// Files that failed
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed(_)))
    }

    /// Files that were never started
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped))
    }

    /// True when nothing failed
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, predicate: impl Fn(&FileOutcome) -> bool) -> usize {
        self.outcomes.values().filter(|o| predicate(o)).count()
    }

    /// Format the report with colors (requires console feature)
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            use console::{style, Emoji};

            static OK: Emoji<'_, '_> = Emoji("✓", "[OK]");
            static SKIP: Emoji<'_, '_> = Emoji("-", "[SKIP]");
            static FAIL: Emoji<'_, '_> = Emoji("✗", "[FAIL]");

            let mut output = String::new();
            for (path, outcome) in &self.outcomes {
                let line = match outcome {
                    FileOutcome::Processed { events, scanned, .. } => format!(
                        "[{}] {} ({} of {} events)",
                        OK,
                        style(path.display()).green(),
                        events,
                        scanned
                    ),
                    FileOutcome::Failed(error) => format!(
                        "[{}] {} - {}: {}",
                        FAIL,
                        style(path.display()).red(),
                        style("FAILED").red().bold(),
                        error
                    ),
                    FileOutcome::Skipped => {
                        format!("[{}] {}", SKIP, style(path.display()).yellow())
                    }
                };
                output.push_str(&line);
                output.push('\n');
            }
            output.push_str(&format!(
                "{}: {} processed, {} failed, {} skipped\n",
                style("Summary").bold(),
                style(self.processed()).green(),
                style(self.failed()).red(),
                style(self.skipped()).yellow()
            ));
            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            format!("{}", self)
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} processed, {} failed, {} skipped",
            self.processed(),
            self.failed(),
            self.skipped()
        )?;
        for (path, outcome) in &self.outcomes {
            match outcome {
                FileOutcome::Processed { events, scanned, .. } => writeln!(
                    f,
                    "  ok      {} ({} of {} events)",
                    path.display(),
                    events,
                    scanned
                )?,
                FileOutcome::Failed(error) => {
                    writeln!(f, "  failed  {}: {}", path.display(), error)?
                }
                FileOutcome::Skipped => writeln!(f, "  skipped {}", path.display())?,
            }
        }
        Ok(())
    }
}

/// Default worker count: available cores, at most four
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().min(4))
        .unwrap_or(1)
}

/// Configuration for batch and folder processing
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Per-file pipeline settings
    pub processor: ProcessorConfig,

    /// Files processed concurrently
    pub workers: usize,

    /// Where documents are written; `processed/` next to each input when unset
    pub output_dir: Option<PathBuf>,

    /// Set to stop scheduling files that have not started
    pub cancel: Arc<AtomicBool>,

    /// Optional progress channel
    pub progress: Option<Sender<JobStatus>>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            processor: ProcessorConfig::default(),
            workers: default_workers(),
            output_dir: None,
            cancel: Arc::new(AtomicBool::new(false)),
            progress: None,
        }
    }
}

impl BatchConfig {
    /// Set per-file pipeline settings
    pub fn with_processor(mut self, processor: ProcessorConfig) -> Self {
        self.processor = processor;
        self
    }

    /// Set worker count (0 is treated as 1)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set output directory
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    /// Publish progress on a channel
    pub fn with_progress(mut self, progress: Sender<JobStatus>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Handle that cancels the batch when set to `true`
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }
}

/// Runs the pipeline over many files
#[derive(Debug, Clone, Default)]
pub struct BatchProcessor {
    config: BatchConfig,
}

impl BatchProcessor {
    /// Create a batch processor
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Process every file and write one document per file.
    ///
    /// Fails only when no path points at an existing file; individual
    /// failures are recorded in the report.
    pub fn process_many(&self, paths: &[PathBuf]) -> Result<BatchReport, BatchError> {
        self.config.processor.validate()?;
        if !paths.iter().any(|p| p.is_file()) {
            return Err(BatchError::NoInputFiles);
        }

        let results = self.run(paths, |path, result| match result {
            FileResult::Processed(processed) => self.write_document(path, processed),
            FileResult::Failed(err) => FileOutcome::Failed(err.to_string()),
            FileResult::Skipped => FileOutcome::Skipped,
        })?;

        let report = BatchReport {
            outcomes: paths.iter().cloned().zip(results).collect(),
        };
        info!(
            "Batch finished: {} processed, {} failed, {} skipped",
            report.processed(),
            report.failed(),
            report.skipped()
        );
        Ok(report)
    }

    /// Process every file and keep the results in memory, in input order.
    pub fn process_each(&self, paths: &[PathBuf]) -> Result<Vec<FileResult>, BatchError> {
        self.config.processor.validate()?;
        self.run(paths, |_, result| result)
    }

    fn write_document(&self, path: &Path, processed: ProcessedFile) -> FileOutcome {
        let events = processed.events.len();
        let scanned = processed.summary.total_scanned;
        let output = default_output_path(path, self.config.output_dir.as_deref());
        match OutputDocument::from(processed).write_to(&output) {
            Ok(()) => {
                info!("Wrote {}", output.display());
                FileOutcome::Processed {
                    output: Some(output),
                    events,
                    scanned,
                }
            }
            Err(err) => {
                warn!("Failed to write {}: {}", output.display(), err);
                FileOutcome::Failed(err.to_string())
            }
        }
    }

    /// Run every file through the pipeline and map each result with `finish`
    /// on the worker that produced it. Output order follows `paths`.
    fn run<T, F>(&self, paths: &[PathBuf], finish: F) -> Result<Vec<T>, BatchError>
    where
        T: Send,
        F: Fn(&Path, FileResult) -> T + Sync,
    {
        let started = AtomicUsize::new(0);
        let job = |path: &PathBuf| {
            finish(path.as_path(), self.process_one(path.as_path(), &started, paths.len()))
        };

        #[cfg(feature = "parallel")]
        if self.config.workers > 1 && paths.len() > 1 {
            use rayon::prelude::*;

            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.workers)
                .thread_name(|i| format!("rootsift-worker-{i}"))
                .build()
                .map_err(|err| BatchError::ThreadPool(err.to_string()))?;
            return Ok(pool.install(|| paths.par_iter().map(job).collect()));
        }

        Ok(paths.iter().map(job).collect())
    }

    fn process_one(&self, path: &Path, started: &AtomicUsize, total: usize) -> FileResult {
        if self.config.cancel.load(Ordering::SeqCst) {
            self.notify(JobStatus::Skipped {
                file: path.to_path_buf(),
            });
            return FileResult::Skipped;
        }

        let current = started.fetch_add(1, Ordering::SeqCst) + 1;
        self.notify(JobStatus::Processing {
            file: path.to_path_buf(),
            current,
            total,
        });
        info!("Processing {} of {}: {}", current, total, path.display());

        match EventProcessor::with_config(self.config.processor.clone()).process_file(path) {
            Ok(processed) => {
                self.notify(JobStatus::Processed {
                    file: path.to_path_buf(),
                    events: processed.events.len(),
                });
                FileResult::Processed(processed)
            }
            Err(err) => {
                warn!("{}: {}", path.display(), err);
                self.notify(JobStatus::Failed {
                    file: path.to_path_buf(),
                    error: err.to_string(),
                });
                FileResult::Failed(err)
            }
        }
    }

    fn notify(&self, status: JobStatus) {
        if let Some(progress) = &self.config.progress {
            // A dropped receiver only means nobody is listening.
            let _ = progress.send(status);
        }
    }
}
