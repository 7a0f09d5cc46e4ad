//! Cart provider scope and accessor.
//!
//! Mount a [`CartProvider`] once near the root of the client, then run the
//! UI work inside [`CartProvider::scope`]. Code in that scope reaches the cart
//! through [`use_cart`] without it being threaded through every call.
//!
//! The scope is task-local: a task started with `tokio::spawn` does not
//! inherit it. Hand such tasks a cloned [`CartStore`] or enter the scope again.

use std::future::Future;

use crate::config::CartConfig;
use crate::error::{CartError, Result};
use crate::store::CartStore;

tokio::task_local! {
    static CURRENT_CART: CartStore;
}

/// A mounted, hydrated cart store ready to be injected into scopes.
#[derive(Debug, Clone)]
pub struct CartProvider {
    store: CartStore,
}

impl CartProvider {
    /// Mount `store`, loading the persisted cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the persisted cart cannot be read or decoded.
    pub async fn mount(store: CartStore) -> Result<Self> {
        store.hydrate().await?;
        tracing::info!(key = store.storage_key(), "cart provider mounted");
        Ok(Self { store })
    }

    /// Build the store described by `config` and mount it.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the persisted cart cannot be read or decoded.
    pub async fn from_config(config: &CartConfig) -> Result<Self> {
        let store = CartStore::new(config.open_storage(), config);
        Self::mount(store).await
    }

    /// The mounted store.
    #[must_use]
    pub const fn store(&self) -> &CartStore {
        &self.store
    }

    /// Run `f` with the cart available to [`use_cart`].
    pub async fn scope<F>(&self, f: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_CART.scope(self.store.clone(), f).await
    }

    /// Run the synchronous closure `f` with the cart available to [`use_cart`].
    pub fn sync_scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        CURRENT_CART.sync_scope(self.store.clone(), f)
    }
}

/// Get the cart of the enclosing provider scope.
///
/// # Errors
///
/// Returns `CartError::OutsideProvider` when called outside
/// [`CartProvider::scope`] or [`CartProvider::sync_scope`].
pub fn use_cart() -> Result<CartStore> {
    CURRENT_CART
        .try_with(CartStore::clone)
        .map_err(|_| CartError::OutsideProvider)
}
