use anyhow::{Context, Result};
use log::info;
use std::io;
use std::path::PathBuf;

use rootsift::batch::{BatchConfig, BatchProcessor};
use rootsift::output::{default_output_path, OutputDocument};
use rootsift::processor::EventProcessor;

/// Process one file directly, or several as a batch
pub fn run(files: Vec<PathBuf>, batch: BatchConfig, stdout: bool) -> Result<()> {
    match files.as_slice() {
        [input] => run_single(input.clone(), batch, stdout),
        _ if stdout => anyhow::bail!("--stdout needs exactly one input file"),
        _ => run_batch(files, batch),
    }
}

fn run_single(input: PathBuf, batch: BatchConfig, stdout: bool) -> Result<()> {
    info!("rootsift - ROOT event extraction");
    info!("Input: {}", input.display());
    info!(
        "Chunk size: {}, max events: {}, experiment: {}, scan: {}",
        batch.processor.chunk_size,
        batch.processor.max_events,
        batch.processor.experiment,
        batch.processor.scan_mode
    );

    let processed = EventProcessor::with_config(batch.processor.clone())
        .process_file(&input)
        .with_context(|| format!("Failed to process {}", input.display()))?;
    for warning in &processed.summary.warnings {
        log::warn!("{}", warning);
    }
    let summary = processed.summary.to_string();
    let document = OutputDocument::from(processed);

    if stdout {
        document
            .to_writer(io::stdout().lock())
            .context("Failed to write document to stdout")?;
        println!();
        return Ok(());
    }

    let output = default_output_path(&input, batch.output_dir.as_deref());
    document
        .write_to(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("{}", summary);
    println!("Output: {}", output.display());
    Ok(())
}

fn run_batch(files: Vec<PathBuf>, batch: BatchConfig) -> Result<()> {
    info!(
        "Processing {} files with {} workers",
        files.len(),
        batch.workers
    );
    let report = BatchProcessor::new(batch)
        .process_many(&files)
        .context("Batch processing failed")?;

    print!("{}", report.format_colored());
    if !report.is_success() {
        anyhow::bail!("{} of {} files failed", report.failed(), files.len());
    }
    Ok(())
}
