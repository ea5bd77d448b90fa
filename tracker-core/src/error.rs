/// Structured error types for tracker-core.
///
/// Uses `thiserror` so library consumers get composable errors.
/// Binary crates (tracker-cli) wrap these with `anyhow`.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tracker-core operations
#[derive(Error, Debug)]
pub enum TrackerError {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Configuration file could not be parsed
    #[error("Invalid config file {path:?}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    /// Configuration error
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// Unknown value for a text-backed enum
    #[error("invalid {kind} value: '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    /// Month key not in YYYY-MM form
    #[error("Invalid month '{value}': expected YYYY-MM")]
    InvalidMonth { value: String },

    /// Amount must be strictly positive
    #[error("{field} must be greater than zero")]
    NonPositiveAmount { field: &'static str },
}

/// Result type alias for tracker-core operations
pub type Result<T> = std::result::Result<T, TrackerError>;

impl TrackerError {
    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Create an unknown-variant error
    pub fn unknown_variant(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.into(),
        }
    }

    /// Create an invalid month error
    pub fn invalid_month(value: impl Into<String>) -> Self {
        Self::InvalidMonth {
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrackerError::unknown_variant("priority", "urgent");
        assert_eq!(err.to_string(), "invalid priority value: 'urgent'");

        let err = TrackerError::invalid_month("2024-13");
        assert!(err.to_string().contains("YYYY-MM"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: TrackerError = io_err.into();

        assert!(matches!(err, TrackerError::Io { .. }));
    }
}
