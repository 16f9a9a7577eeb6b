//! TOML configuration file support.
//!
//! Settings that would otherwise be repeated on every invocation can live in
//! a config file; flags given on the command line win over file values.
//!
//! ```toml
//! # rootsift.toml
//! [processing]
//! chunk_size = 100000
//! max_events = 2000
//! workers = 8
//! experiment = "atlas"
//! exact = true
//! output_dir = "/data/processed"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration structure for rootsift.toml files.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Processing settings shared by every command.
    #[serde(default)]
    pub processing: ProcessingConfig,
}

/// The `[processing]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Events read per chunk.
    pub chunk_size: Option<usize>,

    /// Cap on output events per document.
    pub max_events: Option<usize>,

    /// Files processed concurrently.
    pub workers: Option<usize>,

    /// Experiment selector: auto, cms, atlas or alice.
    pub experiment: Option<String>,

    /// Read every event instead of stopping at twice the cap.
    pub exact: Option<bool>,

    /// Directory for output documents.
    pub output_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Load the file if one was given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }
}
