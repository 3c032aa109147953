//! Core error types for `Traktarr`.

use thiserror::Error;

/// Core error type for `Traktarr` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Credential store failed to read or write.
    #[error("Credential store error: {0}")]
    Store(String),
}
