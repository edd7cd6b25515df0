use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Unknown control: {0}")]
    UnknownControl(String),
    #[error("Invalid status selection: '{0}' (expected 1-4 or one of NOT_STARTED, IN_PROGRESS, IMPLEMENTED, NOT_APPLICABLE)")]
    InvalidStatusSelection(String),
    #[error("State file {} is corrupt: {reason}", .path.display())]
    CorruptState { path: PathBuf, reason: String },
    #[error("State file is locked by another process: {}", .0.display())]
    StateLocked(PathBuf),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl TrackerError {
    /// Errors the caller can recover from by re-prompting; no state was touched.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TrackerError::UnknownControl(_) | TrackerError::InvalidStatusSelection(_)
        )
    }
}
