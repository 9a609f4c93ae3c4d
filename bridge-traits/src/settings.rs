//! Host settings access.
//!
//! The player core only ever reads a handful of boolean switches while it is
//! on the demux thread, so the contract here is synchronous and read-mostly.
//! Hosts back it with whatever preference storage they already have.

use crate::error::Result;
use crate::platform::PlatformSendSync;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Key-value settings lookup.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::settings::SettingsStore;
///
/// fn rds_enabled(store: &dyn SettingsStore) -> bool {
///     store
///         .get_bool("pvrplayback.enableradiords")
///         .ok()
///         .flatten()
///         .unwrap_or(false)
/// }
/// ```
pub trait SettingsStore: PlatformSendSync {
    /// Retrieve a boolean value.
    ///
    /// Returns `Ok(None)` when the key has never been set.
    fn get_bool(&self, key: &str) -> Result<Option<bool>>;

    /// Store a boolean value.
    fn set_bool(&self, key: &str, value: bool) -> Result<()>;

    /// Check if a setting exists.
    fn has_key(&self, key: &str) -> Result<bool>;
}

/// In-memory settings store.
///
/// Suitable for tests and for embedders that resolve their settings up front.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RwLock<HashMap<String, bool>>,
}

impl MemorySettingsStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given boolean settings.
    pub fn with_bools<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, bool)>,
        K: Into<String>,
    {
        let values = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self {
            values: RwLock::new(values),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.values.read().get(key).copied())
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }

    fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.values.read().contains_key(key))
    }
}
