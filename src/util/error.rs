//! Error types for the renderer core.
//!
//! Geometry queries and buffer serialization never fail on malformed
//! data; they degrade to a non-hit or a truncated scene. `Error` covers
//! the boundary where failure is real: settings persistence surfaced
//! to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for renderer operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Settings file does not exist or cannot be accessed
    #[error("Settings file not found: {0}")]
    SettingsNotFound(PathBuf),

    /// Platform config directory could not be determined
    #[error("No config directory available on this platform")]
    NoConfigDir,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Result type alias for renderer operations.
pub type Result<T> = std::result::Result<T, Error>;
