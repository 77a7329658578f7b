//! Guest cart persistence.
//!
//! A typed wrapper over the key-value store for the `guest_cart` key.
//! Reads degrade to an empty cart on any failure (missing key, corrupt
//! payload, I/O error) - a guest must never be locked out of the cart by
//! bad local state.

use tracing::warn;

use copperleaf_core::StoredCartItem;

use crate::storage::{KeyValueStore, StorageError, keys};

/// Typed access to the persisted guest cart.
#[derive(Debug)]
pub struct GuestCartStore<K> {
    store: K,
}

impl<K: KeyValueStore> GuestCartStore<K> {
    /// Wrap a key-value store.
    pub const fn new(store: K) -> Self {
        Self { store }
    }

    /// Load the stored guest cart; empty on any failure.
    pub fn load(&self) -> Vec<StoredCartItem> {
        match self.store.get(keys::GUEST_CART) {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(items) => items,
                Err(e) => {
                    warn!(error = %e, "Guest cart payload is corrupt, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read guest cart, starting empty");
                Vec::new()
            }
        }
    }

    /// Persist the guest cart, replacing the previous payload.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the underlying write fails.
    pub fn save(&self, items: &[StoredCartItem]) -> Result<(), StorageError> {
        let value = serde_json::to_value(items)?;
        self.store.set(keys::GUEST_CART, &value)
    }

    /// Remove the persisted guest cart entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying removal fails.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(keys::GUEST_CART)
    }
}
