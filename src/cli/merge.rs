use anyhow::{Context, Result};
use log::info;
use std::io;
use std::path::PathBuf;

use rootsift::batch::{BatchConfig, BatchProcessor};
use rootsift::output::default_output_path;

/// Merge every matching file of a folder into one document
pub fn run(folder: PathBuf, extension: &str, batch: BatchConfig, stdout: bool) -> Result<()> {
    info!("rootsift - folder merge");
    info!("Folder: {} (*.{})", folder.display(), extension);

    let output = default_output_path(&folder, batch.output_dir.as_deref());
    let merged = BatchProcessor::new(batch)
        .process_folder(&folder, extension)
        .with_context(|| format!("Failed to merge {}", folder.display()))?;

    if stdout {
        merged
            .document
            .to_writer(io::stdout().lock())
            .context("Failed to write document to stdout")?;
        println!();
    } else {
        merged
            .document
            .write_to(&output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        print!("{}", merged.report.format_colored());
        println!("{}", merged.document.metadata);
        println!("Output: {}", output.display());
    }

    if merged.report.processed() == 0 {
        anyhow::bail!("No file in {} could be processed", folder.display());
    }
    Ok(())
}
