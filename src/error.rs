//! Error types for SleepGuard

use thiserror::Error;

use crate::schema::ValidationError;

/// Errors that reject a request before any risk is computed
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse sensor reading: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid sensor reading: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
