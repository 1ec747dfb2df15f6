//! Error types for VRCX launch coordination.
//!
//! Only the configuration-directory check surfaces to the user. Every other
//! failure in this crate is absorbed by the caller and degrades to "not a
//! duplicate" or "handoff attempted".

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for launch coordination.
#[derive(Debug, Error)]
pub enum LaunchError {
    // Configuration errors
    #[error("Config directory is a file: {path:?}")]
    ConfigDirectoryIsFile { path: PathBuf },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // IPC errors
    #[error("IPC endpoint {endpoint} unavailable: {message}")]
    Ipc { endpoint: String, message: String },

    // Validation errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },
}

/// Result type alias for launch coordination operations.
pub type Result<T> = std::result::Result<T, LaunchError>;

impl From<std::io::Error> for LaunchError {
    fn from(err: std::io::Error) -> Self {
        LaunchError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for LaunchError {
    fn from(err: serde_json::Error) -> Self {
        LaunchError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl LaunchError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        LaunchError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Whether this error must be shown to the user before exiting.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, LaunchError::ConfigDirectoryIsFile { .. })
    }
}
