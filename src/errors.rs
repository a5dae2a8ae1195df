//! Error types for the lexivec retrieval core
//!
//! Boundary failures (embedding provider, knowledge store, override
//! store) are modeled here so callers can log and degrade. The public
//! pipeline entry points catch these internally; they are never raised
//! across the crate boundary.

use thiserror::Error;

/// Main error type for retrieval operations
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Embedding provider failures (bad response, missing vector)
    #[error("Embedding provider '{provider}' failed: {reason}")]
    ProviderError { provider: String, reason: String },

    /// Provider returned a vector of unexpected dimension
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Knowledge store (vector or lexical index) failures
    #[error("Knowledge store error: {0}")]
    StoreError(String),

    /// Tenant override store failures
    #[error("Override store error: {0}")]
    OverrideError(String),

    /// Timeout on a blocking boundary call
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for retrieval operations
pub type Result<T> = std::result::Result<T, RetrievalError>;

impl From<anyhow::Error> for RetrievalError {
    fn from(err: anyhow::Error) -> Self {
        RetrievalError::ConfigError(err.to_string())
    }
}
