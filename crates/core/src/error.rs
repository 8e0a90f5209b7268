//! Error types for the feature pipeline.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the feature pipeline.
///
/// Undefined cells produced by warm-up windows or degenerate statistics are
/// not errors; they travel through the table as [`crate::Value`] `None`.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (invalid window, span, horizon, ...).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input table error (missing columns, empty table, bad cells).
    #[error("Input error: {0}")]
    Input(String),

    /// Timestamp could not be parsed.
    #[error("Parse error at row {row}: {message}")]
    Parse { row: usize, message: String },

    /// Failure persisting the output table.
    #[error("Output error: {0}")]
    Output(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration could not be decoded.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an input error.
    pub fn input(msg: impl Into<String>) -> Self {
        Error::Input(msg.into())
    }

    /// Create a timestamp parse error for the given row.
    pub fn parse(row: usize, msg: impl Into<String>) -> Self {
        Error::Parse {
            row,
            message: msg.into(),
        }
    }

    /// Create an output error.
    pub fn output(msg: impl Into<String>) -> Self {
        Error::Output(msg.into())
    }
}
