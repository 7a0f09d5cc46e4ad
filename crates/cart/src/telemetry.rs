//! Tracing setup for hosts embedding the cart.
//!
//! The store only emits `tracing` events; installing a subscriber is up to the
//! host application. [`init_tracing`] is the default one.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "marker_cart=info";

/// Install a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Defaults to info level for the cart if `RUST_LOG` is not set. Safe to call
/// more than once; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Like [`init_tracing`], emitting one JSON object per event.
pub fn init_json_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .try_init();
}
