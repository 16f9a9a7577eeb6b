//! Folder mode: process every file of a folder and merge the results.
//!
//! Per-file event lists are concatenated in input order, ranked once and
//! capped at the global `max_events`. Because every per-file list is itself
//! a top-K of its file, the merged top-K equals ranking all passing events of
//! all files together (exact mode; bounded mode carries its per-file
//! approximation along).

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::info;

use crate::output::OutputDocument;
use crate::processor::ProcessedFile;
use crate::ranking::{rank, ScanMode};
use crate::summary::ProcessingSummary;

use super::{BatchError, BatchProcessor, BatchReport, FileOutcome, FileResult};

/// Extension of the files picked up by folder mode
pub const DEFAULT_EXTENSION: &str = "root";

/// Merged document and per-file report of a folder run
#[derive(Debug, Clone)]
pub struct MergedOutput {
    /// One document for the whole folder
    pub document: OutputDocument,
    /// Outcome of each input
    pub report: BatchReport,
}

/// Files directly inside `folder` with the given extension, sorted by path.
///
/// The extension match ignores case and a leading dot.
pub fn list_inputs(folder: &Path, extension: &str) -> Result<Vec<PathBuf>, BatchError> {
    if !folder.is_dir() {
        return Err(BatchError::NotADirectory(folder.to_path_buf()));
    }
    let wanted = extension.trim_start_matches('.').to_lowercase();

    let mut files = Vec::new();
    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().to_lowercase() == wanted);
        if path.is_file() && matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Merge per-file results into one document.
///
/// - events: concatenated, ranked by HT and capped at `max_events`
/// - scanned counts are summed; particle kinds are the union over files
/// - the mean particle count covers every retained per-file event
/// - distributions describe the merged, capped event list
/// - failures are listed under `errors`, absent when there are none
pub fn merge(
    source: &str,
    results: Vec<(PathBuf, FileResult)>,
    max_events: usize,
    scan_mode: ScanMode,
    started: Instant,
) -> MergedOutput {
    let mut report = BatchReport::default();
    let mut summaries = Vec::new();
    let mut events = Vec::new();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut source_files = Vec::new();

    for (path, result) in results {
        let name = path.display().to_string();
        source_files.push(name.clone());
        let outcome = match result {
            FileResult::Processed(ProcessedFile {
                events: file_events,
                summary,
            }) => {
                let outcome = FileOutcome::Processed {
                    output: None,
                    events: file_events.len(),
                    scanned: summary.total_scanned,
                };
                events.extend(file_events);
                warnings.extend(summary.warnings.iter().map(|w| format!("{name}: {w}")));
                summaries.push(summary);
                outcome
            }
            FileResult::Failed(err) => {
                errors.push(format!("{name}: {err}"));
                FileOutcome::Failed(err.to_string())
            }
            FileResult::Skipped => {
                warnings.push(format!("{name}: skipped (cancelled)"));
                FileOutcome::Skipped
            }
        };
        report.outcomes.insert(path, outcome);
    }

    let retained = events.len();
    let total_particles: usize = events.iter().map(|e| e.num_particles()).sum();
    let scanned: u64 = summaries.iter().map(|s| s.total_scanned).sum();
    let particle_types: BTreeSet<String> = summaries
        .iter()
        .flat_map(|s| s.particle_types.iter().cloned())
        .collect();

    let events = rank(events, max_events);
    let mut summary = ProcessingSummary::new(source, common(&summaries, |s| &s.tree_name, "mixed"))
        .with_events(&events)
        .with_timing(scanned, started.elapsed());
    summary.experiment = common(&summaries, |s| &s.experiment, "MIXED");
    summary.detection = common(&summaries, |s| &s.detection, "mixed");
    summary.scan_mode = scan_mode;
    summary.early_terminated = summaries.iter().any(|s| s.early_terminated);
    summary.particle_types = particle_types.into_iter().collect();
    summary.avg_particles_per_event = if retained == 0 {
        0.0
    } else {
        total_particles as f64 / retained as f64
    };
    summary.warnings = warnings;
    summary.source_files = Some(source_files);
    summary.errors = (!errors.is_empty()).then_some(errors);

    info!("{}", summary);
    MergedOutput {
        document: OutputDocument {
            metadata: summary,
            events,
        },
        report,
    }
}

/// The value shared by every summary, `mixed` when they disagree, empty
/// when there are none.
fn common<'a>(
    summaries: &'a [ProcessingSummary],
    field: impl Fn(&'a ProcessingSummary) -> &'a String,
    mixed: &str,
) -> String {
    let mut values = summaries.iter().map(field);
    let Some(first) = values.next() else {
        return String::new();
    };
    if values.all(|v| v == first) {
        first.clone()
    } else {
        mixed.to_string()
    }
}

impl BatchProcessor {
    /// Process every `*.<extension>` file of a folder into one merged document.
    pub fn process_folder(
        &self,
        folder: &Path,
        extension: &str,
    ) -> Result<MergedOutput, BatchError> {
        let started = Instant::now();
        let inputs = list_inputs(folder, extension)?;
        if inputs.is_empty() {
            return Err(BatchError::NoInputFiles);
        }
        info!(
            "Merging {} .{} files from {}",
            inputs.len(),
            extension.trim_start_matches('.'),
            folder.display()
        );

        let results = self.process_each(&inputs)?;
        let processor = &self.config.processor;
        Ok(merge(
            &folder.display().to_string(),
            inputs.into_iter().zip(results).collect(),
            processor.max_events,
            processor.scan_mode,
            started,
        ))
    }
}
