use std::path::PathBuf;

use crate::detector::DetectError;
use crate::reader::ReaderError;

/// Errors that can occur while processing one file
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The input path does not exist
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The input exists but is not a readable ROOT file
    #[error("Not a readable ROOT file: {path}: {reason}")]
    NotRootFile {
        /// Input path
        path: PathBuf,
        /// Reader message
        reason: String,
    },

    /// The file contains no tree that could be processed
    #[error("No TTree found in {0}")]
    NoTree(String),

    /// Invalid processor configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error while reading event data
    #[error("Reader error: {0}")]
    Reader(#[from] ReaderError),

    /// The ROOT decoder panicked on malformed data
    #[error("Decoder panic: {0}")]
    DecoderPanic(String),
}

impl ProcessError {
    /// Attach the source label to a detection error.
    pub(crate) fn from_detect(label: &str, err: DetectError) -> Self {
        match err {
            DetectError::NoTree => ProcessError::NoTree(label.to_string()),
            DetectError::Reader(err) => ProcessError::Reader(err),
        }
    }
}
