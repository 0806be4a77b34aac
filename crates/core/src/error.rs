//! Error types for the TAQ microstructure engine.

use crate::types::{BarField, Timestamp};
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the TAQ microstructure engine.
///
/// Undefined metric values are never errors; they surface as `None` in
/// the output series.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed input bar.
    #[error("Invalid bar #{index} at {bar_start}: {field} {reason}")]
    Validation {
        /// Position of the bar in the input sequence.
        index: usize,
        /// Start of the offending bar.
        bar_start: Timestamp,
        /// Field that failed the check.
        field: BarField,
        /// What was wrong with it.
        reason: String,
    },

    /// Data error (invalid or missing data outside a single bar).
    #[error("Data error: {0}")]
    Data(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create a validation error for one bar field.
    pub fn validation(
        index: usize,
        bar_start: Timestamp,
        field: BarField,
        reason: impl Into<String>,
    ) -> Self {
        Error::Validation {
            index,
            bar_start,
            field,
            reason: reason.into(),
        }
    }
}
