//! Error types for memrepo
//!
//! Status codes in [`RepositoryHolder`](crate::RepositoryHolder) are the
//! primary signaling channel for request outcomes. This error type covers the
//! remaining cases: setup mistakes that fail fast at construction, and
//! internal failures (serialization, codecs) that abort a single call.

use std::io;
use thiserror::Error;

/// Result type alias for memrepo operations
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Error types for the memrepo entity store
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// I/O error (config file access)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Entity could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Storage codec failed to encode or decode a blob
    #[error("Codec error: {0}")]
    Codec(String),

    /// Repository was misconfigured at setup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Two search algorithms were registered under the same id
    #[error("Duplicate search algorithm: {0}")]
    DuplicateSearch(String),

    /// A search algorithm id was referenced but never registered
    #[error("Unknown search algorithm: {0}")]
    UnknownSearch(String),

    /// Worker task failed before producing a result
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RepositoryError {
    /// Build a serialization error from any displayable cause
    pub fn serialization(cause: impl std::fmt::Display) -> Self {
        RepositoryError::Serialization(cause.to_string())
    }

    /// Build a configuration error from any displayable cause
    pub fn configuration(cause: impl std::fmt::Display) -> Self {
        RepositoryError::Configuration(cause.to_string())
    }

    /// True for errors raised while wiring up a repository
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            RepositoryError::Configuration(_)
                | RepositoryError::DuplicateSearch(_)
                | RepositoryError::UnknownSearch(_)
        )
    }
}
