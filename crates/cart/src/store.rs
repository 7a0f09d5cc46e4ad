//! The cart store.
//!
//! A mutation runs entirely under the state lock: read the latest committed
//! cart, apply the change to a copy, write the copy to storage, then commit
//! it and broadcast it. Concurrent callers queue on the lock, so each one sees
//! the result of the previous and the persisted slot always matches what is
//! held in memory.
//!
//! The write and the commit run in their own task that owns the lock guard.
//! A caller that stops polling (timeout, dropped UI future) cannot leave the
//! slot ahead of memory: once the write has started, the commit follows.

use std::sync::Arc;

use marker_core::{Cart, DecrementPolicy, NewLineItem};
use tokio::sync::{Mutex, OwnedMutexGuard, watch};
use tracing::{Instrument, Span, debug, info, instrument, warn};

use crate::config::CartConfig;
use crate::error::{CartError, Result};
use crate::storage::KeyValueStorage;

/// Shared handle to the cart.
///
/// Cheaply cloneable via `Arc`; every clone reads and mutates the same cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    decrement_policy: DecrementPolicy,
    state: Arc<Mutex<State>>,
    committed: watch::Sender<Cart>,
}

struct State {
    cart: Cart,
    hydrated: bool,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.inner.key)
            .field("decrement_policy", &self.inner.decrement_policy)
            .field("products", &*self.inner.committed.borrow())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create a store with an empty, not yet hydrated cart.
    ///
    /// # Arguments
    ///
    /// * `storage` - Backend holding the persisted slot
    /// * `config` - Slot key and decrement policy
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>, config: &CartConfig) -> Self {
        let (committed, _) = watch::channel(Cart::new());

        Self {
            inner: Arc::new(CartStoreInner {
                storage,
                key: config.storage_key.clone(),
                decrement_policy: config.decrement_policy,
                state: Arc::new(Mutex::new(State {
                    cart: Cart::new(),
                    hydrated: false,
                })),
                committed,
            }),
        }
    }

    /// Storage slot this store persists to.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.inner.key
    }

    #[must_use]
    pub fn decrement_policy(&self) -> DecrementPolicy {
        self.inner.decrement_policy
    }

    /// Snapshot of the last committed cart.
    #[must_use]
    pub fn products(&self) -> Cart {
        self.inner.committed.borrow().clone()
    }

    /// Watch committed changes.
    ///
    /// The receiver starts at the current cart and is notified once per
    /// committed mutation; no-op operations do not notify.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.inner.committed.subscribe()
    }

    /// Load the persisted cart, once.
    ///
    /// An absent slot leaves the cart empty. Later calls are no-ops. Mutations
    /// issued before hydration hydrate first, so they never get overwritten by
    /// a late load.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the slot cannot be read and
    /// `CartError::Decode` if it does not hold a cart.
    pub async fn hydrate(&self) -> Result<()> {
        let mut state = self.lock().await;
        self.ensure_hydrated(&mut state).await
    }

    /// Add one unit of `candidate`, appending it if it is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if hydration or the storage write fails; the cart
    /// is left unchanged.
    #[instrument(skip(self, candidate), fields(product_id = %candidate.id))]
    pub async fn add_to_cart(&self, candidate: NewLineItem) -> Result<()> {
        self.mutate(|cart| cart.add(candidate)).await
    }

    /// Add one unit to the line with `id`. Unknown ids leave the cart as is.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if hydration or the storage write fails; the cart
    /// is left unchanged.
    #[instrument(skip(self))]
    pub async fn increment(&self, id: &str) -> Result<()> {
        self.mutate(|cart| cart.increment(id)).await
    }

    /// Take one unit off the line with `id`. Unknown ids leave the cart as is.
    ///
    /// At one unit the configured [`DecrementPolicy`] applies.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if hydration or the storage write fails; the cart
    /// is left unchanged.
    #[instrument(skip(self))]
    pub async fn decrement(&self, id: &str) -> Result<()> {
        let policy = self.inner.decrement_policy;
        self.mutate(|cart| cart.decrement(id, policy)).await
    }

    /// Drop the line with `id` regardless of its quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if hydration or the storage write fails.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: &str) -> Result<()> {
        self.mutate(|cart| cart.remove(id)).await
    }

    /// Empty the cart.
    ///
    /// Does not read the persisted slot, so it also resets a slot that no
    /// longer decodes and leaves the store hydrated and usable.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the storage write fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        let state = self.lock().await;
        if state.hydrated && state.cart.is_empty() {
            debug!("cart unchanged");
            return Ok(());
        }

        self.commit(state, Cart::new()).await
    }

    async fn mutate<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Cart) -> bool + Send,
    {
        let mut state = self.lock().await;
        self.ensure_hydrated(&mut state).await?;

        let mut next = state.cart.clone();
        if !apply(&mut next) {
            debug!("cart unchanged");
            return Ok(());
        }

        self.commit(state, next).await
    }

    async fn lock(&self) -> OwnedMutexGuard<State> {
        Arc::clone(&self.inner.state).lock_owned().await
    }

    /// Persist `next` and make it the committed cart, holding `state` throughout.
    async fn commit(&self, state: OwnedMutexGuard<State>, next: Cart) -> Result<()> {
        let store = self.clone();
        let task = tokio::spawn(
            async move { store.persist_and_commit(state, next).await }.instrument(Span::current()),
        );
        task.await?
    }

    async fn persist_and_commit(
        &self,
        mut state: OwnedMutexGuard<State>,
        next: Cart,
    ) -> Result<()> {
        self.persist(&next).await?;

        state.cart = next.clone();
        state.hydrated = true;
        self.inner.committed.send_replace(next);
        debug!(
            lines = state.cart.len(),
            items = state.cart.item_count(),
            "cart committed"
        );
        Ok(())
    }

    async fn ensure_hydrated(&self, state: &mut State) -> Result<()> {
        if state.hydrated {
            return Ok(());
        }

        let stored = self
            .inner
            .storage
            .get(&self.inner.key)
            .await
            .inspect_err(|e| warn!(key = %self.inner.key, error = %e, "failed to read cart"))?;

        let cart = match stored {
            Some(json) => serde_json::from_str::<Cart>(&json).map_err(|e| {
                warn!(key = %self.inner.key, error = %e, "persisted cart is not valid");
                CartError::Decode(e)
            })?,
            None => Cart::new(),
        };

        info!(key = %self.inner.key, lines = cart.len(), "cart hydrated");

        state.cart = cart.clone();
        state.hydrated = true;
        self.inner.committed.send_replace(cart);
        Ok(())
    }

    async fn persist(&self, cart: &Cart) -> Result<()> {
        let json = serde_json::to_string(cart).map_err(CartError::Encode)?;

        self.inner
            .storage
            .set(&self.inner.key, &json)
            .await
            .inspect_err(|e| warn!(key = %self.inner.key, error = %e, "failed to persist cart"))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use marker_core::{Price, ProductId};

    use super::*;
    use crate::storage::{MemoryStorage, StorageError};

    const KEY: &str = "@Marker/products";

    fn widget(id: &str) -> NewLineItem {
        NewLineItem::new(
            ProductId::parse(id).unwrap(),
            "Widget",
            "u",
            Price::from_cents(999),
        )
    }

    fn store_with(storage: &MemoryStorage, config: &CartConfig) -> CartStore {
        CartStore::new(Arc::new(storage.clone()), config)
    }

    async fn persisted(storage: &MemoryStorage) -> Option<Cart> {
        storage
            .get(KEY)
            .await
            .unwrap()
            .map(|json| serde_json::from_str(&json).unwrap())
    }

    /// Storage whose writes can be switched to fail.
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_writes: AtomicBool,
    }

    #[async_trait]
    impl KeyValueStorage for FlakyStorage {
        async fn get(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("quota exceeded".to_string()));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> std::result::Result<(), StorageError> {
            self.inner.remove(key).await
        }
    }

    /// Storage whose writes land at once but take a while to report back.
    struct SlowStorage {
        inner: MemoryStorage,
    }

    #[async_trait]
    impl KeyValueStorage for SlowStorage {
        async fn get(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
            self.inner.set(key, value).await?;
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        }

        async fn remove(&self, key: &str) -> std::result::Result<(), StorageError> {
            self.inner.remove(key).await
        }
    }

    #[tokio::test]
    async fn test_hydrate_absent_slot_is_empty() {
        let storage = MemoryStorage::new();
        let store = store_with(&storage, &CartConfig::default());

        store.hydrate().await.unwrap();

        assert!(store.products().is_empty());
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_hydrate_replaces_cart() {
        let json = r#"[{"id":"a","title":"Widget","image_url":"u","price":9.99,"quantity":3}]"#;
        let storage = MemoryStorage::with_entry(KEY, json);
        let store = store_with(&storage, &CartConfig::default());

        store.hydrate().await.unwrap();

        let cart = store.products();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get("a").unwrap().quantity, 3);
        assert_eq!(cart.get("a").unwrap().price, Price::from_cents(999));
    }

    #[tokio::test]
    async fn test_hydrate_only_once() {
        let storage = MemoryStorage::new();
        let store = store_with(&storage, &CartConfig::default());
        store.hydrate().await.unwrap();

        storage.set(KEY, "not json").await.unwrap();

        assert!(store.hydrate().await.is_ok());
    }

    #[tokio::test]
    async fn test_hydrate_invalid_slot() {
        let storage = MemoryStorage::with_entry(KEY, r#"{"id":"a"}"#);
        let store = store_with(&storage, &CartConfig::default());

        assert!(matches!(store.hydrate().await, Err(CartError::Decode(_))));
    }

    #[tokio::test]
    async fn test_mutation_before_hydrate_keeps_stored_lines() {
        let mut existing = Cart::new();
        existing.add(widget("a"));
        let storage = MemoryStorage::with_entry(KEY, serde_json::to_string(&existing).unwrap());
        let store = store_with(&storage, &CartConfig::default());

        store.add_to_cart(widget("b")).await.unwrap();
        store.hydrate().await.unwrap();

        let cart = store.products();
        assert_eq!(cart.len(), 2);
        assert_eq!(persisted(&storage).await.unwrap(), cart);
    }

    #[tokio::test]
    async fn test_add_persists_resulting_cart() {
        let storage = MemoryStorage::new();
        let store = store_with(&storage, &CartConfig::default());

        store.add_to_cart(widget("a")).await.unwrap();
        assert_eq!(persisted(&storage).await.unwrap(), store.products());

        store.add_to_cart(widget("a")).await.unwrap();
        let cart = store.products();
        assert_eq!(cart.get("a").unwrap().quantity, 2);
        assert_eq!(persisted(&storage).await.unwrap(), cart);
    }

    #[tokio::test]
    async fn test_noop_does_not_write() {
        let storage = MemoryStorage::new();
        let store = store_with(&storage, &CartConfig::default());

        store.increment("zzz").await.unwrap();
        store.decrement("zzz").await.unwrap();

        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_decrement_floor_policy() {
        let storage = MemoryStorage::new();
        let config = CartConfig {
            decrement_policy: DecrementPolicy::FloorAtOne,
            ..CartConfig::default()
        };
        let store = store_with(&storage, &config);

        store.add_to_cart(widget("a")).await.unwrap();
        store.decrement("a").await.unwrap();

        assert_eq!(store.products().get("a").unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_cart_untouched() {
        let storage = Arc::new(FlakyStorage::default());
        let store = CartStore::new(storage.clone(), &CartConfig::default());
        store.add_to_cart(widget("a")).await.unwrap();
        let mut rx = store.subscribe();
        rx.mark_unchanged();

        storage.fail_writes.store(true, Ordering::SeqCst);
        let result = store.increment("a").await;

        assert!(matches!(
            result,
            Err(CartError::Storage(StorageError::Unavailable(_)))
        ));
        assert_eq!(store.products().get("a").unwrap().quantity, 1);
        assert!(!rx.has_changed().unwrap());

        storage.fail_writes.store(false, Ordering::SeqCst);
        store.increment("a").await.unwrap();
        assert_eq!(store.products().get("a").unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn test_abandoned_operation_still_commits_its_write() {
        let storage = MemoryStorage::new();
        let slow = SlowStorage {
            inner: storage.clone(),
        };
        let store = CartStore::new(Arc::new(slow), &CartConfig::default());
        let mut changes = store.subscribe();

        let result =
            tokio::time::timeout(Duration::from_millis(20), store.add_to_cart(widget("a"))).await;
        assert!(result.is_err());

        // Queues behind the in-flight commit.
        store.hydrate().await.unwrap();

        let cart = store.products();
        assert_eq!(cart.get("a").unwrap().quantity, 1);
        assert_eq!(persisted(&storage).await.unwrap(), cart);
        assert_eq!(*changes.borrow_and_update(), cart);
    }

    #[tokio::test]
    async fn test_clear_resets_corrupt_slot() {
        let storage = MemoryStorage::with_entry(KEY, "{garbage");
        let store = store_with(&storage, &CartConfig::default());

        assert!(matches!(
            store.add_to_cart(widget("a")).await,
            Err(CartError::Decode(_))
        ));

        store.clear().await.unwrap();
        assert_eq!(storage.get(KEY).await.unwrap().as_deref(), Some("[]"));

        store.add_to_cart(widget("a")).await.unwrap();
        let cart = store.products();
        assert_eq!(cart.len(), 1);
        assert_eq!(persisted(&storage).await.unwrap(), cart);
    }

    #[tokio::test]
    async fn test_clear_on_empty_hydrated_cart_is_noop() {
        let storage = MemoryStorage::new();
        let store = store_with(&storage, &CartConfig::default());
        store.hydrate().await.unwrap();

        store.clear().await.unwrap();

        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_clear_and_remove() {
        let storage = MemoryStorage::new();
        let store = store_with(&storage, &CartConfig::default());
        store.add_to_cart(widget("a")).await.unwrap();
        store.add_to_cart(widget("b")).await.unwrap();

        store.remove("a").await.unwrap();
        assert!(store.products().get("a").is_none());

        store.clear().await.unwrap();
        assert!(store.products().is_empty());
        assert_eq!(storage.get(KEY).await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_custom_storage_key() {
        let storage = MemoryStorage::new();
        let config = CartConfig {
            storage_key: "@Marker/other".to_string(),
            ..CartConfig::default()
        };
        let store = store_with(&storage, &config);

        store.add_to_cart(widget("a")).await.unwrap();

        assert!(storage.get(KEY).await.unwrap().is_none());
        assert!(storage.get("@Marker/other").await.unwrap().is_some());
        assert_eq!(store.storage_key(), "@Marker/other");
    }
}
