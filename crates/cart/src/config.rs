//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CART_STORAGE_KEY` - Storage slot holding the cart (default: `@Marker/products`)
//! - `CART_STORAGE_DIR` - Directory for file-backed storage (default: in-memory storage)
//! - `CART_DECREMENT_POLICY` - `remove` or `floor` (default: `remove`)

use std::path::PathBuf;
use std::sync::Arc;

use marker_core::DecrementPolicy;
use thiserror::Error;

use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage};

/// Storage slot the cart is persisted under.
pub const DEFAULT_STORAGE_KEY: &str = "@Marker/products";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Key of the storage slot holding the JSON-encoded cart
    pub storage_key: String,
    /// Root directory for file-backed storage; `None` keeps the cart in memory
    pub storage_dir: Option<PathBuf>,
    /// What decrementing a single-unit line does
    pub decrement_policy: DecrementPolicy,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_dir: None,
            decrement_policy: DecrementPolicy::default(),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_key = get_or_default(&lookup, "CART_STORAGE_KEY", DEFAULT_STORAGE_KEY);
        let storage_dir = get_optional(&lookup, "CART_STORAGE_DIR").map(PathBuf::from);

        let decrement_policy = get_or_default(&lookup, "CART_DECREMENT_POLICY", "remove")
            .parse::<DecrementPolicy>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CART_DECREMENT_POLICY".to_string(), e.to_string())
            })?;

        Ok(Self {
            storage_key,
            storage_dir,
            decrement_policy,
        })
    }

    /// Build the storage backend this configuration selects.
    #[must_use]
    pub fn open_storage(&self) -> Arc<dyn KeyValueStorage> {
        match &self.storage_dir {
            Some(dir) => Arc::new(FileStorage::new(dir.clone())),
            None => Arc::new(MemoryStorage::new()),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional variable, treating blank values as unset.
fn get_optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

/// Get a variable with a default value.
fn get_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    get_optional(lookup, key).unwrap_or_else(|| default.to_string())
}
