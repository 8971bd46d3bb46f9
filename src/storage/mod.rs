//! Storage module for object persistence
//!
//! This module provides a unified, synchronous object storage interface with
//! multiple backend implementations:
//! - **Memory storage** - An in-process map, used as the test double
//! - **Local filesystem storage** - A directory per bucket
//! - **AWS S3 storage** - Cloud object storage (optional, requires `s3` feature)
//!
//! Every backend binds its bucket at construction time and exposes the same
//! key-addressed [`StorageApiSync`] contract: overwrite-on-put, `NotFound` on
//! a missing get, and idempotent delete.
//!
//! # Examples
//!
//! ```rust
//! use recipe_store::storage::{MemoryStorage, StorageApiSync};
//! use bytes::Bytes;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = MemoryStorage::new();
//! storage.put("my_key", Bytes::from("Hello, World!"))?;
//! assert_eq!(storage.get("my_key")?, Bytes::from("Hello, World!"));
//!
//! storage.delete("my_key")?;
//! assert!(!storage.exists("my_key")?);
//! # Ok(())
//! # }
//! ```
//!
//! ## S3 Storage (requires `s3` feature)
//!
//! ```rust,ignore
//! use recipe_store::storage::{S3Config, S3Storage};
//!
//! let storage = S3Storage::new(S3Config {
//!     endpoint_url: Some("http://localhost:4566".to_string()),
//!     path_style: true,
//!     ..Default::default()
//! })?;
//! ```

pub mod storage_api;
pub mod storage_local;
pub mod storage_memory;

#[cfg(feature = "s3")]
pub mod storage_s3;

pub use storage_api::{StorageApiSync, StorageBackend};
pub use storage_local::{LocalConfig, LocalStorage};
pub use storage_memory::MemoryStorage;

#[cfg(feature = "s3")]
pub use storage_s3::{S3Config, S3Storage};

use crate::error::{StorageError, StorageResult};
use std::path::PathBuf;

/// Storage constants
pub mod constants {
    //! Constants used throughout the storage module

    /// Bucket used when none is configured
    pub const DEFAULT_BUCKET: &str = "recipes";

    /// Maximum storage key length
    pub const MAX_KEY_LENGTH: usize = 1024;
}

/// A backend chosen at runtime
pub type DynStorage = Box<dyn StorageApiSync>;

/// Storage factory for creating storage instances
pub struct StorageFactory;

impl StorageFactory {
    /// Create a memory storage instance
    pub fn create_memory() -> MemoryStorage {
        MemoryStorage::new()
    }

    /// Create a local storage instance
    pub fn create_local(config: LocalConfig) -> StorageResult<LocalStorage> {
        LocalStorage::new(config)
    }

    /// Create an S3 storage instance (requires `s3` feature)
    #[cfg(feature = "s3")]
    pub fn create_s3(config: S3Config) -> StorageResult<S3Storage> {
        S3Storage::new(config)
    }

    /// Create storage from URL
    ///
    /// - `memory://` for a fresh in-memory backend
    /// - `file:///path` or a bare path for local storage rooted at `path`,
    ///   using the default bucket directory
    /// - `s3://bucket` for S3, with the rest of the settings taken from the
    ///   environment (see `S3Config::from_env`)
    pub fn from_url(url: &str) -> StorageResult<DynStorage> {
        if url == "memory://" || url == "memory:" {
            return Ok(Box::new(Self::create_memory()));
        }

        if let Some(rest) = url.strip_prefix("s3://") {
            let bucket = rest.split('/').next().unwrap_or_default();
            if bucket.is_empty() {
                return Err(StorageError::UnsupportedUrl { url: url.to_string() });
            }
            return Self::s3_from_bucket(bucket);
        }

        let path = match url.strip_prefix("file://") {
            Some(path) => path,
            None if url.starts_with('/') || url.starts_with("./") => url,
            None => return Err(StorageError::UnsupportedUrl { url: url.to_string() }),
        };

        if path.is_empty() {
            return Err(StorageError::UnsupportedUrl { url: url.to_string() });
        }

        let config = LocalConfig {
            base_path: PathBuf::from(path),
            ..Default::default()
        };
        Ok(Box::new(Self::create_local(config)?))
    }

    #[cfg(feature = "s3")]
    fn s3_from_bucket(bucket: &str) -> StorageResult<DynStorage> {
        let config = S3Config {
            bucket: bucket.to_string(),
            ..S3Config::from_env()
        };
        Ok(Box::new(Self::create_s3(config)?))
    }

    #[cfg(not(feature = "s3"))]
    fn s3_from_bucket(_bucket: &str) -> StorageResult<DynStorage> {
        Err(StorageError::BackendNotAvailable {
            backend: "S3".to_string(),
        })
    }
}
