//! Storage API shared by every backend
//!
//! The record layer only ever talks to [`StorageApiSync`]. Backends bind their
//! bucket (namespace) at construction time, so every call here is keyed by
//! object key alone.

use crate::error::StorageResult;
use bytes::Bytes;
use std::sync::Arc;

/// Storage backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageBackend {
    /// In-process map
    Memory,
    /// Local filesystem storage
    Local,
    /// AWS S3 (or S3-compatible) storage
    S3,
}

/// Synchronous object storage API
///
/// Every call blocks until the backend answers. Implementations must be safe
/// to share between callers; they hold no per-call session state.
pub trait StorageApiSync: Send + Sync {
    /// Put an object into storage, overwriting any existing object at `key`
    fn put(&self, key: &str, data: Bytes) -> StorageResult<()>;

    /// Get an object from storage
    ///
    /// Fails with `StorageError::ResourceNotFound` when `key` is absent.
    fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Delete an object from storage; deleting an absent key succeeds
    fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check if an object exists
    fn exists(&self, key: &str) -> StorageResult<bool>;

    /// List object keys starting with `prefix`, sorted
    fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Get storage backend type
    fn backend_type(&self) -> StorageBackend;
}

impl<T: StorageApiSync + ?Sized> StorageApiSync for Box<T> {
    fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        (**self).put(key, data)
    }

    fn get(&self, key: &str) -> StorageResult<Bytes> {
        (**self).get(key)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        (**self).delete(key)
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        (**self).exists(key)
    }

    fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        (**self).list(prefix)
    }

    fn backend_type(&self) -> StorageBackend {
        (**self).backend_type()
    }
}

impl<T: StorageApiSync + ?Sized> StorageApiSync for Arc<T> {
    fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        (**self).put(key, data)
    }

    fn get(&self, key: &str) -> StorageResult<Bytes> {
        (**self).get(key)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        (**self).delete(key)
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        (**self).exists(key)
    }

    fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        (**self).list(prefix)
    }

    fn backend_type(&self) -> StorageBackend {
        (**self).backend_type()
    }
}

/// Utility functions for storage operations
pub mod utils {
    use crate::error::{StorageError, StorageResult};
    use crate::storage::constants::MAX_KEY_LENGTH;

    /// Validate storage key
    pub fn validate_key(key: &str) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
                reason: "Key cannot be empty".to_string(),
            });
        }

        if key.len() > MAX_KEY_LENGTH {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
                reason: format!("Key too long (max {} bytes)", MAX_KEY_LENGTH),
            });
        }

        Ok(())
    }
}
