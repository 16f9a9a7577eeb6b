use anyhow::{Context, Result};
use std::path::PathBuf;

use rootsift::detector;
use rootsift::reader::{DataFile, EventTree, RootFile};
use rootsift::schema::{ExperimentSelector, ResolvedSchema};

/// Display trees, detection verdict and resolved branches of a ROOT file
pub fn run(file: PathBuf, selector: ExperimentSelector) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }
    let mut root = RootFile::open(&file).context("Failed to open ROOT file")?;

    println!("rootsift File Information");
    println!("=========================");
    println!("File: {}", file.display());
    println!();

    println!("Trees:");
    for name in root.tree_names() {
        let tree = root
            .open_tree(&name)
            .with_context(|| format!("Failed to open tree '{}'", name))?;
        println!(
            "  {} ({} entries, {} branches)",
            name,
            tree.num_entries(),
            tree.branch_names().len()
        );
    }
    println!();

    let detection = detector::select(&mut root, selector).context("Detection failed")?;
    println!("Detection: {}", detection);
    if detection.is_low_confidence() {
        println!("  (no profile matched; the result is a guess)");
    }
    println!();

    let tree = root.open_tree(&detection.tree_name)?;
    let schema = ResolvedSchema::for_tree(detection.experiment.profile(), &tree);
    print_schema(&schema);
    Ok(())
}

fn print_schema(schema: &ResolvedSchema) {
    if schema.is_empty() {
        println!("Resolved schema: no usable branches");
        return;
    }

    println!("Resolved schema:");
    for particle in &schema.particles {
        #[cfg(feature = "colorized_output")]
        let kind = console::style(particle.kind.as_str()).bold();
        #[cfg(not(feature = "colorized_output"))]
        let kind = particle.kind.as_str();

        println!("  {}", kind);
        for (field, branch) in &particle.columns {
            println!("    {:<8} {}", field.as_str(), branch);
        }
    }
    if !schema.scalars.is_empty() {
        println!("  scalars");
        for (alias, branch) in &schema.scalars {
            println!("    {:<8} {}", alias.name(), branch);
        }
    }
}
