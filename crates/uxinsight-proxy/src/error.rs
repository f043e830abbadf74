//! Error types for the uxinsight-proxy crate.

use thiserror::Error;

/// Errors that can occur in the rewriting proxy.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Proxy bind failed on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing URL parameter")]
    MissingParameter,

    #[error("Invalid target URL '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Malformed URL '{value}': {reason}")]
    MalformedUrl { value: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP parse error: {0}")]
    HttpParse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProxyError {
    /// HTTP status surfaced to the browser for a whole-request failure.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            ProxyError::MissingParameter | ProxyError::HttpParse(_) => 400,
            _ => 500,
        }
    }
}

/// Result type alias for proxy operations.
pub type Result<T> = std::result::Result<T, ProxyError>;
