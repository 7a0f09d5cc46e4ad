//! Key-value persistence for the cart slot.
//!
//! The store only ever needs three calls against a string-keyed,
//! string-valued backend. Device storage, a test double, or anything else
//! that can hold a string under a key can sit behind [`KeyValueStorage`].
//!
//! # Backends
//!
//! - [`MemoryStorage`] - Process-local map, shared between clones
//! - [`FileStorage`] - One file per key under a root directory

use async_trait::async_trait;
use thiserror::Error;

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem or device I/O failed for a key.
    #[error("I/O error on key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The backend refused the request (quota, locked, offline, ...).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous string key-value storage.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`, or `None` if the slot is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the slot under `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
