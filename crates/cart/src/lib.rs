//! Marker Cart - Persistent shopping cart store.
//!
//! Holds the cart for the Marker mobile client: an in-memory list of line
//! items, mirrored into a single key-value storage slot as a JSON array.
//!
//! # Architecture
//!
//! - [`CartStore`] owns the authoritative [`Cart`](marker_core::Cart). Every
//!   mutation is computed from the latest committed cart, written to storage,
//!   and only then committed and broadcast to subscribers.
//! - [`storage`] defines the [`KeyValueStorage`] seam plus in-memory and
//!   file-backed implementations.
//! - [`provider`] injects a store into a task scope; [`use_cart`] reads it back
//!   and fails immediately outside a mounted provider.
//! - [`config`] loads storage and policy settings from the environment.
//!
//! # Example
//!
//! ```rust
//! use marker_cart::{CartConfig, CartProvider, use_cart};
//! use marker_core::{NewLineItem, Price, ProductId};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = CartProvider::from_config(&CartConfig::default()).await?;
//!
//! provider
//!     .scope(async {
//!         let cart = use_cart()?;
//!         let widget = NewLineItem::new(ProductId::parse("a")?, "Widget", "u", Price::from_cents(999));
//!         cart.add_to_cart(widget).await?;
//!         assert_eq!(cart.products().item_count(), 1);
//!         Ok::<_, Box<dyn std::error::Error>>(())
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod provider;
pub mod storage;
pub mod store;
pub mod telemetry;

pub use config::{CartConfig, ConfigError, DEFAULT_STORAGE_KEY};
pub use error::{CartError, Result};
pub use provider::{CartProvider, use_cart};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use store::CartStore;
