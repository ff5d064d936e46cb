//! Error types for the cache layer.

use crate::transport::FetchError;
use odmeta_codec::{SerializationError, ValidationError};
use odmeta_model::SchemaError;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors surfaced by [`MetadataCache`](crate::MetadataCache).
///
/// Every variant is `Clone`: a single fetch outcome is handed to every
/// caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// No entity answers to this name, even after asking the service.
    #[error("entity not found: {0}")]
    NotFound(String),

    /// The service returned a schema that cannot be built or published.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The transport failed after exhausting its retry policy.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// This caller's wait bound elapsed. The fetch itself keeps running.
    #[error("timed out waiting for schema of {0}")]
    Timeout(String),

    /// Catalog persistence failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The cache has been shut down.
    #[error("metadata cache is shut down")]
    Closed,
}

impl CacheError {
    /// Returns true for [`CacheError::NotFound`] and transport-level not-found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CacheError::NotFound(_) | CacheError::Fetch(FetchError::NotFound(_))
        )
    }

    /// Returns true if repeating the call may succeed without changing inputs.
    pub fn is_transient(&self) -> bool {
        match self {
            CacheError::Fetch(err) => err.is_retryable(),
            CacheError::Timeout(_) => true,
            _ => false,
        }
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        CacheError::Storage(err.to_string())
    }
}
