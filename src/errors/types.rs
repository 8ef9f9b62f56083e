//! Error type definitions for the channel-forge application
//!
//! One taxonomy covers both the ingestion and the EPG query paths.
//! Configuration and fetch problems are fatal to the current operation but
//! never to the process; prior persisted state and caches stay untouched.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// A required setting (playlist URL, guide URL) is missing or invalid
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Upstream fetch failed: network error, timeout or non-2xx response
    #[error("Fetch error: {url} - {message}")]
    Fetch { url: String, message: String },

    /// Malformed top-level document structure (e.g. missing XMLTV root)
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// A second ingest trigger arrived while a run was in flight
    #[error("An ingest run is already in progress")]
    IngestInProgress,

    /// Ingest trigger token mismatch
    #[error("Unauthorized")]
    Unauthorized,

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem errors from the manifest writer or state persistence
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failures
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a fetch error for a specific URL
    pub fn fetch<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
