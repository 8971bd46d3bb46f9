//! Local filesystem storage backend implementation
//!
//! A directory stands in for the bucket. Every object is one flat file in
//! `base_path/bucket`, named by escaping the key: bytes outside
//! `[A-Za-z0-9_-]` become `%XX`. The mapping is one-to-one, so `mac` and
//! `mac/cheese` (or `nachos` and `./nachos`) are separate objects just as
//! they are in an object store.
//!
//! Writes go to a uniquely named temporary file in the bucket directory that
//! is then persisted over the target, so a reader never sees a half-written
//! object and concurrent writers to one key do not disturb each other.

use crate::error::{StorageError, StorageResult};
use crate::storage::constants::DEFAULT_BUCKET;
use crate::storage::storage_api::{utils, StorageApiSync, StorageBackend};
use bytes::Bytes;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Longest file name most filesystems accept
const MAX_FILE_NAME_LENGTH: usize = 255;

/// Prefix of in-flight temporary files; escaped keys never start with `.`
const TEMP_PREFIX: &str = ".tmp-";

/// Local storage configuration
#[derive(Debug, Clone)]
pub struct LocalConfig {
    /// Base directory for storage
    pub base_path: PathBuf,
    /// Bucket directory under `base_path`
    pub bucket: String,
    /// Create directories if they don't exist
    pub create_dirs: bool,
    /// Use atomic writes (write to temp file, then rename)
    pub atomic_writes: bool,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("./storage"),
            bucket: DEFAULT_BUCKET.to_string(),
            create_dirs: true,
            atomic_writes: true,
        }
    }
}

/// Escape a key into a single file name
pub fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for &byte in key.as_bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            encoded.push(byte as char);
        } else {
            encoded.push('%');
            encoded.push_str(&hex::encode_upper([byte]));
        }
    }
    encoded
}

/// Reverse [`encode_key`]; `None` for names this backend did not write
pub fn decode_key(file_name: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(file_name.len());
    let mut rest = file_name.as_bytes();

    while let Some((&first, tail)) = rest.split_first() {
        if first == b'%' {
            let escaped = tail.get(..2)?;
            bytes.extend(hex::decode(escaped).ok()?);
            rest = &tail[2..];
        } else if first.is_ascii_alphanumeric() || first == b'_' || first == b'-' {
            bytes.push(first);
            rest = tail;
        } else {
            return None;
        }
    }

    String::from_utf8(bytes).ok()
}

/// Local filesystem storage backend
#[derive(Debug)]
pub struct LocalStorage {
    root: PathBuf,
    config: LocalConfig,
}

impl LocalStorage {
    /// Create a new local storage backend
    pub fn new(config: LocalConfig) -> StorageResult<Self> {
        let root = config.base_path.join(&config.bucket);

        if config.create_dirs && !root.exists() {
            fs::create_dir_all(&root).map_err(|e| StorageError::OperationFailed {
                operation: "create_bucket_directory".to_string(),
                reason: format!("Failed to create {}: {}", root.display(), e),
            })?;
        }

        if !root.is_dir() {
            return Err(StorageError::OperationFailed {
                operation: "verify_bucket_directory".to_string(),
                reason: format!("{} is not an existing directory", root.display()),
            });
        }

        tracing::info!(root = %root.display(), "local storage ready");
        Ok(Self { root, config })
    }

    /// Directory holding this bucket's objects
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to its file inside the bucket directory
    fn resolve(&self, key: &str) -> StorageResult<PathBuf> {
        utils::validate_key(key)?;

        let file_name = encode_key(key);
        if file_name.len() > MAX_FILE_NAME_LENGTH {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
                reason: format!(
                    "Escaped key is {} bytes, local storage allows {}",
                    file_name.len(),
                    MAX_FILE_NAME_LENGTH
                ),
            });
        }

        Ok(self.root.join(file_name))
    }

    fn write_atomic(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.root)
            .map_err(|e| StorageError::OperationFailed {
                operation: "create_temp_file".to_string(),
                reason: format!("Failed to create temporary file: {}", e),
            })?;

        temp.write_all(data)
            .and_then(|_| temp.flush())
            .map_err(|e| StorageError::OperationFailed {
                operation: "write_temp_file".to_string(),
                reason: format!("Failed to write temporary file: {}", e),
            })?;

        NamedTempFile::persist(temp, path).map_err(|e| StorageError::OperationFailed {
            operation: "atomic_rename".to_string(),
            reason: format!("Failed to persist {}: {}", path.display(), e.error),
        })?;

        Ok(())
    }
}

impl StorageApiSync for LocalStorage {
    fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        let path = self.resolve(key)?;

        if self.config.atomic_writes {
            self.write_atomic(&path, &data)
        } else {
            fs::write(&path, &data).map_err(|e| StorageError::OperationFailed {
                operation: "write_file".to_string(),
                reason: format!("Failed to write {}: {}", path.display(), e),
            })
        }
    }

    fn get(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.resolve(key)?;
        match fs::read(&path) {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::ResourceNotFound {
                resource: key.to_string(),
            }),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                Err(StorageError::PermissionDenied {
                    resource: path.display().to_string(),
                })
            }
            Err(e) => Err(StorageError::OperationFailed {
                operation: "read_file".to_string(),
                reason: format!("Failed to read {}: {}", path.display(), e),
            }),
        }
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::OperationFailed {
                operation: "delete_file".to_string(),
                reason: format!("Failed to delete {}: {}", path.display(), e),
            }),
        }
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.resolve(key)?.is_file())
    }

    fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| StorageError::OperationFailed {
            operation: "read_directory".to_string(),
            reason: format!("Failed to read {}: {}", self.root.display(), e),
        })?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::OperationFailed {
                operation: "read_directory_entry".to_string(),
                reason: format!("Failed to read directory entry: {}", e),
            })?;

            if !entry.path().is_file() {
                continue;
            }
            let Some(key) = entry.file_name().to_str().and_then(decode_key) else {
                continue;
            };
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
