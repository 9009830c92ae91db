//! Error types for musical-oklab operations.
//!
//! Every component boundary returns [`Result`]. The infallible entry points
//! (`process_color`, `classify`, `process`) recover from these errors locally
//! and never surface them to the caller.

use std::io;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting, enhancing or classifying colors.
#[derive(Error, Debug)]
pub enum Error {
    /// Hex string is not `#RGB` or `#RRGGBB`.
    #[error("Invalid hex color: {0:?}")]
    InvalidHex(String),

    /// Gradient requested with fewer than two stops.
    #[error("Gradient needs at least 2 steps, got {0}")]
    InvalidGradientSteps(usize),

    /// No preset is registered under the given name.
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// Name does not match any emotional state.
    #[error("Unknown emotional state: {0}")]
    UnknownEmotionalState(String),

    /// A preset could not be built from the supplied values.
    #[error("Invalid preset: {0}")]
    InvalidPreset(String),

    /// The genre classifier failed to answer a query.
    #[error("Genre classifier error: {0}")]
    GenreClassifier(String),

    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    ConfigNotFound(String),

    /// Configuration parsing error with line number.
    #[error("configuration error at line {line}: {message}")]
    ConfigParse {
        /// Line number where the error occurred (1-indexed).
        line: usize,
        /// Error message describing the issue.
        message: String,
    },

    /// Invalid configuration value.
    #[error("invalid configuration value for '{key}': {message}")]
    ConfigInvalid {
        /// The configuration key with invalid value.
        key: String,
        /// Why the value was rejected.
        message: String,
    },

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error (file operations, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_hex_display() {
        let err = Error::InvalidHex("#12".to_string());
        assert!(err.to_string().contains("#12"));
    }

    #[test]
    fn test_gradient_steps_display() {
        let err = Error::InvalidGradientSteps(1);
        assert!(err.to_string().contains('1'));
    }

    #[test]
    fn test_config_parse_error_includes_line_number() {
        let err = Error::ConfigParse {
            line: 42,
            message: "invalid value".to_string(),
        };
        let display = err.to_string();

        assert!(display.contains("42"), "Error should include line number: {display}");
        assert!(display.contains("invalid value"), "Error should include message: {display}");
    }

    #[test]
    fn test_config_invalid_includes_key() {
        let err = Error::ConfigInvalid {
            key: "cache.capacity".to_string(),
            message: "must be positive".to_string(),
        };
        assert!(err.to_string().contains("cache.capacity"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
