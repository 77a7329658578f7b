//! Key-value persistence for client-side state.
//!
//! The cart engine persists the guest cart through the [`KeyValueStore`]
//! trait. Two implementations ship here: [`MemoryStore`] (tests, embedded
//! hosts) and [`json_file::JsonFileStore`] (one JSON document per key on
//! disk). Reads and writes are single synchronous steps, so guest-cart
//! read-modify-write cycles have no interleaving hazard.

pub mod json_file;

pub use json_file::JsonFileStore;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Reserved storage keys.
pub mod keys {
    /// Guest cart line items (`[{productId, quantity}]`).
    pub const GUEST_CART: &str = "guest_cart";

    /// Reserved for an authenticated-cart cache. Currently never written;
    /// the server cart is always refetched instead.
    pub const USER_CART: &str = "user_cart";
}

/// Errors raised by key-value store implementations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored payload was not valid JSON.
    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A namespaced JSON key-value store.
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read or decode fails.
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write fails.
    fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), StorageError>;

    /// Remove the value stored under `key`. Removing a missing key is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying removal fails.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// In-memory store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        let map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), StorageError> {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        map.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        map.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.get(keys::GUEST_CART).unwrap().is_none());

        let value = json!([{"productId": "p1", "quantity": 2}]);
        store.set(keys::GUEST_CART, &value).unwrap();
        assert_eq!(store.get(keys::GUEST_CART).unwrap(), Some(value));

        store.remove(keys::GUEST_CART).unwrap();
        assert!(store.get(keys::GUEST_CART).unwrap().is_none());
    }

    #[test]
    fn test_memory_store_remove_missing_is_ok() {
        let store = MemoryStore::new();
        store.remove("never-set").unwrap();
    }
}
