//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// One or more scenarios failed
    #[error("{failed} of {total} cases failed")]
    RunFailed {
        /// Failed case count
        failed: usize,
        /// Recorded case count
        total: usize,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Binary built without chromium support
    #[error("Browser support not compiled in; rebuild with --features browser")]
    BrowserUnavailable,

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Waypoint library error
    #[error("Waypoint error: {0}")]
    Waypoint(#[from] waypoint::WaypointError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
