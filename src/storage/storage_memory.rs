//! In-memory storage backend

use crate::error::{StorageError, StorageResult};
use crate::storage::storage_api::{utils, StorageApiSync, StorageBackend};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Objects = HashMap<String, Bytes>;

/// In-memory storage backend
///
/// Clones share the same backing map, so a handle kept by a test sees every
/// write made through a store that was given another clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    data: Arc<RwLock<Objects>>,
}

impl MemoryStorage {
    /// Create a new, empty memory backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub fn len(&self) -> StorageResult<usize> {
        Ok(self.read("len")?.len())
    }

    /// Whether the backend holds no objects
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.read("is_empty")?.is_empty())
    }

    fn read(&self, operation: &str) -> StorageResult<RwLockReadGuard<'_, Objects>> {
        self.data.read().map_err(|_| poisoned(operation))
    }

    fn write(&self, operation: &str) -> StorageResult<RwLockWriteGuard<'_, Objects>> {
        self.data.write().map_err(|_| poisoned(operation))
    }
}

fn poisoned(operation: &str) -> StorageError {
    StorageError::OperationFailed {
        operation: operation.to_string(),
        reason: "memory storage lock poisoned".to_string(),
    }
}

impl StorageApiSync for MemoryStorage {
    fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        utils::validate_key(key)?;
        self.write("put")?.insert(key.to_string(), data);
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Bytes> {
        utils::validate_key(key)?;
        self.read("get")?
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::ResourceNotFound {
                resource: key.to_string(),
            })
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        utils::validate_key(key)?;
        self.write("delete")?.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        utils::validate_key(key)?;
        Ok(self.read("exists")?.contains_key(key))
    }

    fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .read("list")?
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let storage = MemoryStorage::new();
        let data = Bytes::from("Hello, World!");

        storage.put("greeting", data.clone()).unwrap();
        assert_eq!(storage.get("greeting").unwrap(), data);
    }

    #[test]
    fn test_put_overwrites() {
        let storage = MemoryStorage::new();
        storage.put("key", Bytes::from("first")).unwrap();
        storage.put("key", Bytes::from("second")).unwrap();

        assert_eq!(storage.get("key").unwrap(), Bytes::from("second"));
        assert_eq!(storage.len().unwrap(), 1);
    }

    #[test]
    fn test_get_missing() {
        let storage = MemoryStorage::new();
        match storage.get("missing") {
            Err(StorageError::ResourceNotFound { resource }) => assert_eq!(resource, "missing"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_exists_and_delete() {
        let storage = MemoryStorage::new();
        assert!(!storage.exists("key").unwrap());

        storage.put("key", Bytes::from("data")).unwrap();
        assert!(storage.exists("key").unwrap());

        storage.delete("key").unwrap();
        assert!(!storage.exists("key").unwrap());
        // second delete is a no-op
        storage.delete("key").unwrap();
    }

    #[test]
    fn test_list_with_prefix() {
        let storage = MemoryStorage::new();
        storage.put("b/two", Bytes::from("2")).unwrap();
        storage.put("a/one", Bytes::from("1")).unwrap();
        storage.put("b/one", Bytes::from("1")).unwrap();

        assert_eq!(storage.list("").unwrap(), vec!["a/one", "b/one", "b/two"]);
        assert_eq!(storage.list("b/").unwrap(), vec!["b/one", "b/two"]);
    }

    #[test]
    fn test_clones_share_data() {
        let storage = MemoryStorage::new();
        let other = storage.clone();

        storage.put("shared", Bytes::from("data")).unwrap();
        assert!(other.exists("shared").unwrap());
        assert!(!other.is_empty().unwrap());
    }

    #[test]
    fn test_rejects_empty_key() {
        let storage = MemoryStorage::new();
        assert!(matches!(
            storage.put("", Bytes::new()),
            Err(StorageError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_control_characters_in_key() {
        let storage = MemoryStorage::new();
        storage.put("line\nbreak", Bytes::from("a")).unwrap();
        storage.put("nul\0byte", Bytes::from("b")).unwrap();

        assert_eq!(storage.get("line\nbreak").unwrap(), Bytes::from("a"));
        assert_eq!(storage.get("nul\0byte").unwrap(), Bytes::from("b"));
    }
}
