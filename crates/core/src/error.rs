//! Core Error Types
//!
//! Defines the foundational error types used across the Persona Chat workspace.
//! These error types are dependency-free (only thiserror + std) to keep the core
//! crate lightweight.
//!
//! The application crate extends these with additional variants (I/O,
//! settings persistence) that belong to the outer layers.

use thiserror::Error;

/// Core error type for the Persona Chat workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed ChatML documents
    #[error("Invalid ChatML: {0}")]
    InvalidChatMl(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid ChatML error
    pub fn invalid_chatml(msg: impl Into<String>) -> Self {
        Self::InvalidChatMl(msg.into())
    }
}

/// Convert CoreError to a string
impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}
