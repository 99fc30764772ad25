//! Result and error types for Waypoint.

use thiserror::Error;

/// Result type for Waypoint operations
pub type WaypointResult<T> = Result<T, WaypointError>;

/// Errors that can occur while driving the mission planner
#[derive(Debug, Error)]
pub enum WaypointError {
    /// A widget operation failed after exhausting its retry budget
    #[error("{widget} interaction failed after {attempts} attempts: {source}")]
    WidgetInteraction {
        /// Widget kind and target (e.g. `dropdown "HQ"`)
        widget: String,
        /// Number of attempts made
        attempts: u32,
        /// Last underlying failure
        #[source]
        source: Box<WaypointError>,
    },

    /// A scene or store handle could not be acquired in time
    #[error("Map handle `{what}` unavailable after {attempts} attempts: {last_error}")]
    MapUnavailable {
        /// Handle or script that was being acquired
        what: String,
        /// Number of attempts made
        attempts: u32,
        /// Last evaluation failure
        last_error: String,
    },

    /// A bounded poll exhausted its attempts without observing the condition
    #[error("Timed out waiting for {what} after {attempts} attempts")]
    Timeout {
        /// Condition being polled
        what: String,
        /// Number of attempts made
        attempts: u32,
    },

    /// Derived metric text could not be parsed
    #[error("Cannot parse metric `{text}`: {reason}")]
    MetricParse {
        /// Raw rendered text
        text: String,
        /// Why parsing failed
        reason: String,
    },

    /// Locator resolved to no element
    #[error("Element not found: {locator}")]
    ElementNotFound {
        /// Locator description
        locator: String,
    },

    /// Element exists but cannot receive the action
    #[error("Element {locator} is not actionable: {reason}")]
    NotActionable {
        /// Locator description
        locator: String,
        /// Failed actionability check
        reason: String,
    },

    /// A select operation finished but the displayed value does not match
    #[error("Expected selection matching {expected}, found `{actual}`")]
    SelectionMismatch {
        /// Requested value
        expected: String,
        /// Rendered value
        actual: String,
    },

    /// Invalid geometric input
    #[error("Geometry error: {message}")]
    Geometry {
        /// Error message
        message: String,
    },

    /// In-page script evaluation error
    #[error("Script evaluation failed: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Input simulation error
    #[error("Input simulation failed: {message}")]
    Input {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Page target could not be closed
    #[error("Failed to close page: {message}")]
    PageClose {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Scenario assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl WaypointError {
    /// Create a script evaluation error
    #[must_use]
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }

    /// Create an input simulation error
    #[must_use]
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a geometry error
    #[must_use]
    pub fn geometry(message: impl Into<String>) -> Self {
        Self::Geometry {
            message: message.into(),
        }
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Whether this error came from exhausting a bounded budget
    #[must_use]
    pub const fn is_exhaustion(&self) -> bool {
        matches!(
            self,
            Self::WidgetInteraction { .. } | Self::MapUnavailable { .. } | Self::Timeout { .. }
        )
    }
}

/// Fail with [`WaypointError::AssertionFailed`] unless `condition` holds
///
/// # Errors
///
/// Returns an assertion failure carrying `message`
pub fn ensure(condition: bool, message: impl Into<String>) -> WaypointResult<()> {
    if condition {
        Ok(())
    } else {
        Err(WaypointError::assertion(message))
    }
}
