//! Application Errors
//!
//! Failures of the settings and template layers. Generation never surfaces
//! these: provider failures travel inside the chat and profile outcomes.

use thiserror::Error;

/// Error type for settings persistence and template management
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing home directory and similar environment problems
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Encrypted secret store failures
    #[error("Secret storage error: {0}")]
    Secrets(String),

    /// Settings or template override rejected
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a secret storage error
    pub fn secrets(msg: impl Into<String>) -> Self {
        Self::Secrets(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
