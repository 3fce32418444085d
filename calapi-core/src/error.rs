//! Error types for calapi.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while loading configuration or a calendar source.
#[derive(Error, Debug)]
pub enum CalApiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported source kind '{0}', expected 'file' or 'url'")]
    UnsupportedSource(String),

    #[error("Unable to read iCal file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Recurrence error: {0}")]
    Recurrence(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cancelled")]
    Cancelled,
}

/// Result type alias for calapi operations.
pub type CalApiResult<T> = Result<T, CalApiError>;
