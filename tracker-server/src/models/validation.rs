//! Validation error types

use std::fmt;

/// Validation error for request input
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format (e.g., hex color)
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Number must be greater than zero
    NotPositive { field: &'static str },

    /// Number must not be negative
    Negative { field: &'static str },

    /// More decimal places than the column stores
    TooPrecise { field: &'static str, scale: u32 },

    /// Magnitude exceeds what the column stores
    TooLarge { field: &'static str },

    /// Two fields contradict each other (e.g., end before start)
    InvalidRange { field: &'static str, reason: &'static str },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
            Self::NotPositive { field } => write!(f, "{} must be greater than zero", field),
            Self::Negative { field } => write!(f, "{} cannot be negative", field),
            Self::TooPrecise { field, scale } => {
                write!(f, "{} allows at most {} decimal places", field, scale)
            }
            Self::TooLarge { field } => write!(f, "{} is too large", field),
            Self::InvalidRange { field, reason } => write!(f, "{}: {}", field, reason),
        }
    }
}

impl std::error::Error for ValidationError {}
