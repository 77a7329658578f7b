//! File-backed key-value store.
//!
//! One JSON document per key, stored as `<dir>/<key>.json`. Keys are the
//! fixed constants in [`super::keys`], so no path sanitization is needed.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{KeyValueStore, StorageError};

/// Key-value store writing one JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// The directory this store writes into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(value)?;
        fs::write(self.path_for(key), bytes)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::keys;
    use serde_json::json;

    fn scratch_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "copperleaf-storage-{label}-{}",
            std::process::id()
        ))
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = scratch_dir("roundtrip");
        let store = JsonFileStore::new(&dir).unwrap();

        assert!(store.get(keys::GUEST_CART).unwrap().is_none());

        let value = json!([{"productId": "p1", "quantity": 1}]);
        store.set(keys::GUEST_CART, &value).unwrap();
        assert_eq!(store.get(keys::GUEST_CART).unwrap(), Some(value));

        store.remove(keys::GUEST_CART).unwrap();
        assert!(store.get(keys::GUEST_CART).unwrap().is_none());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_file_store_corrupt_payload_is_serde_error() {
        let dir = scratch_dir("corrupt");
        let store = JsonFileStore::new(&dir).unwrap();

        fs::write(store.path_for("bad"), b"{not json").unwrap();
        let err = store.get("bad").unwrap_err();
        assert!(matches!(err, StorageError::Serde(_)));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let dir = scratch_dir("remove-missing");
        let store = JsonFileStore::new(&dir).unwrap();
        store.remove("never-set").unwrap();
        let _ = fs::remove_dir_all(dir);
    }
}
