//! Error types for the conversation store.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors surfaced by conversation store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Import payload was rejected before any mutation.
    #[error("import payload rejected: {0}")]
    ImportRejected(String),

    /// The conversation list could not be serialized.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The storage slot rejected a read or write.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// An export file could not be written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for conversation store operations.
pub type StoreResult<T> = Result<T, StoreError>;
