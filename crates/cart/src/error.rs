//! Error types for the cart store.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors surfaced by cart operations.
///
/// Nothing is retried: an operation either persisted and committed its new
/// cart, or it returns one of these and the in-memory cart is untouched.
#[derive(Debug, Error)]
pub enum CartError {
    /// The accessor was called with no mounted provider in scope.
    #[error("use_cart must be used within a CartProvider")]
    OutsideProvider,

    /// Reading or writing the storage slot failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The persisted slot does not hold a JSON array of line items.
    #[error("persisted cart is not valid: {0}")]
    Decode(#[source] serde_json::Error),

    /// The cart could not be serialized for storage.
    #[error("failed to encode cart: {0}")]
    Encode(#[source] serde_json::Error),

    /// The task writing and committing the cart panicked or was cancelled.
    #[error("cart commit task failed: {0}")]
    Commit(#[from] tokio::task::JoinError),
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
