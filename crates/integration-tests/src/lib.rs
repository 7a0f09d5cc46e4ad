//! Integration tests for the Marker cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marker-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_properties` - Observable behavior of the store and accessor
//! - `cart_persistence` - File-backed storage across restarts
//!
//! This library holds the fixtures shared by the test binaries.

use std::sync::Arc;

use marker_cart::{CartConfig, CartStore, KeyValueStorage, MemoryStorage};
use marker_core::{Cart, NewLineItem, Price, ProductId};

/// Slot key every fixture persists under.
pub const KEY: &str = marker_cart::DEFAULT_STORAGE_KEY;

/// Build a candidate line item priced in cents.
///
/// # Panics
///
/// Panics if `id` is not a valid product id.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn product(id: &str, title: &str, cents: i64) -> NewLineItem {
    NewLineItem::new(
        ProductId::parse(id).unwrap(),
        title,
        format!("https://cdn.marker.app/products/{id}.png"),
        Price::from_cents(cents),
    )
}

/// A store over `storage` with the default configuration.
#[must_use]
pub fn store_over(storage: &MemoryStorage) -> CartStore {
    CartStore::new(Arc::new(storage.clone()), &CartConfig::default())
}

/// Decode whatever the store last wrote to `storage`.
///
/// # Panics
///
/// Panics if the storage read fails or the slot is not a cart.
#[allow(clippy::unwrap_used)]
pub async fn persisted_cart(storage: &dyn KeyValueStorage) -> Option<Cart> {
    storage
        .get(KEY)
        .await
        .unwrap()
        .map(|json| serde_json::from_str(&json).unwrap())
}
