// Error types for the metric logger

use thiserror::Error;

/// Errors raised by [`crate::MetricLogger`] and its backends.
///
/// Every error surfaces synchronously to the caller of the triggering
/// operation. Nothing is retried.
#[derive(Debug, Error)]
pub enum LoggerError {
    /// Bad constructor arguments (mode, bin size, empty metric group, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown metric group '{group}'. Valid groups = {valid:?}")]
    UnknownGroup { group: String, valid: Vec<String> },

    #[error("Unregistered keys for group '{group}': {keys:?}")]
    UnregisteredKeys { group: String, keys: Vec<String> },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Run is already finished; finish() cannot be called again")]
    AlreadyFinished,

    #[error("Tracking service error: {0}")]
    Remote(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl LoggerError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        LoggerError::Configuration(msg.into())
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        LoggerError::Validation(msg.into())
    }
}

impl From<reqwest::Error> for LoggerError {
    fn from(err: reqwest::Error) -> Self {
        LoggerError::Remote(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LoggerError>;
