//! Durable key-value slots backing conversation persistence.
//!
//! One slot holds one serialized conversation list; keys are namespaced per
//! identity by the caller, which is the only isolation mechanism between
//! identities.

pub mod file;
pub mod memory;

pub use file::FileSlotStore;
pub use memory::MemorySlotStore;

use thiserror::Error;

/// Errors from slot read/write operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying IO failure.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend rejected the write (quota, permissions, missing dir).
    #[error("storage write rejected: {0}")]
    WriteRejected(String),
}

/// Result alias for slot operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A durable key-value slot holding one opaque string value per key.
pub trait StorageSlot: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    /// Returns an error when the backend cannot be read.
    fn read(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error when the backend rejects the write.
    fn write(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove the value under `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    /// Returns an error when the backend cannot be modified.
    fn remove(&self, key: &str) -> StorageResult<()>;
}
