//! Error types for the uxinsight crate.

use thiserror::Error;

/// Errors raised by the tracked-page session model.
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Session storage error for key '{key}': {reason}")]
    Storage { key: String, reason: String },

    #[error("Stored session is corrupt: {0}")]
    CorruptSession(String),

    #[error("Malformed relay message: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, InsightError>;
