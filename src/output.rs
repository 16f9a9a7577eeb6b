//! # Output Documents
//!
//! Every run produces one JSON document with exactly two keys:
//!
//! ```json
//! {"metadata": { ... }, "events": [ ... ]}
//! ```
//!
//! Encoding is compact. Files are written through a temporary file in the
//! destination directory and persisted in one rename, so readers never see a
//! partial document.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::event::EventRecord;
use crate::processor::ProcessedFile;
use crate::summary::ProcessingSummary;

/// Default output directory, created next to the input
pub const DEFAULT_OUTPUT_DIR: &str = "processed";

/// Errors raised while writing output documents
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Temporary file could not be moved into place
    #[error("Failed to persist {path}: {source}")]
    Persist {
        /// Destination path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// The two-key output document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDocument {
    /// Processing summary
    pub metadata: ProcessingSummary,
    /// Ranked events
    pub events: Vec<EventRecord>,
}

impl From<ProcessedFile> for OutputDocument {
    fn from(processed: ProcessedFile) -> Self {
        Self {
            metadata: processed.summary,
            events: processed.events,
        }
    }
}

impl OutputDocument {
    /// Compact JSON to any writer.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), OutputError> {
        let mut writer = BufWriter::new(writer);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Compact JSON string.
    pub fn to_json(&self) -> Result<String, OutputError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Atomically write the document to `path`, creating parent directories.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), OutputError> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        self.to_writer(tmp.as_file_mut())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|err| OutputError::Persist {
            path: path.to_path_buf(),
            source: err.error,
        })?;
        Ok(())
    }
}

/// `processed/<stem>.json` next to the input, or `<dir>/<stem>.json`.
///
/// Folders use their own name as the stem and place `processed/` inside
/// the folder.
pub fn default_output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None if input.is_dir() => input.join(DEFAULT_OUTPUT_DIR),
        None => input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(DEFAULT_OUTPUT_DIR),
    };
    dir.join(format!("{stem}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MetVector;
    use crate::schema::Experiment;
    use tempfile::tempdir;

    fn document() -> OutputDocument {
        OutputDocument {
            metadata: ProcessingSummary::new("run.root", "Events"),
            events: vec![EventRecord {
                index: 7,
                experiment: Experiment::Cms,
                ht: 123.456,
                met: 45.678,
                n_bjets: Some(2),
                leading_lepton_pt: 31.0,
                particles: Vec::new(),
                met_vector: MetVector { pt: 45.678, phi: 1.23456 },
                triggers: None,
            }],
        }
    }

    #[test]
    fn test_two_top_level_keys() {
        let json: serde_json::Value = serde_json::from_str(&document().to_json().unwrap()).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 2);
        assert!(json.get("metadata").is_some());
        assert_eq!(json["events"][0]["index"], 7);
        assert_eq!(json["events"][0]["ht"], 123.46);
        assert_eq!(json["events"][0]["met_vector"]["phi"], 1.235);
    }

    #[test]
    fn test_compact_encoding() {
        let text = document().to_json().unwrap();
        assert!(!text.contains('\n'));
        assert!(!text.contains(": "));
        assert!(text.starts_with("{\"metadata\":"));
    }

    #[test]
    fn test_write_to_creates_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed").join("run.json");
        document().write_to(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, document().to_json().unwrap());
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_default_output_path() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("nano.root");
        assert_eq!(
            default_output_path(&input, None),
            dir.path().join("processed").join("nano.json")
        );
        assert_eq!(
            default_output_path(&input, Some(Path::new("/tmp/out"))),
            PathBuf::from("/tmp/out/nano.json")
        );
        assert_eq!(
            default_output_path(dir.path(), None),
            dir.path()
                .join("processed")
                .join(format!("{}.json", dir.path().file_name().unwrap().to_string_lossy()))
        );
    }
}
