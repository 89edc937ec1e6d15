use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for scanning, labeling, and persistence failures.
#[derive(Debug, Error)]
pub enum LabelerError {
    #[error("directory '{}' is not valid", .0.display())]
    InvalidDirectory(PathBuf),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("no files under '{}' have {min}..={max} lines", .root.display())]
    NoMatchingFiles { root: PathBuf, min: usize, max: usize },
    #[error("file '{}' is unreadable: {reason}", .path.display())]
    UnreadableFile { path: PathBuf, reason: String },
    #[error("metadata file '{}' is missing or invalid: {reason}", .path.display())]
    MissingMetadata { path: PathBuf, reason: String },
    #[error("invalid input: {0}")]
    InvalidLabelInput(String),
    #[error("file list failure: {0}")]
    FileList(String),
    #[error("output table failure: {0}")]
    Table(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LabelerError {
    /// True for per-file and operator-input errors that are handled by skipping or re-prompting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnreadableFile { .. } | Self::MissingMetadata { .. } | Self::InvalidLabelInput(_)
        )
    }
}

impl From<csv::Error> for LabelerError {
    fn from(err: csv::Error) -> Self {
        Self::Table(err.to_string())
    }
}
