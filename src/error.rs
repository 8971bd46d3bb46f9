//! Error types for the recipe store
//!
//! This module provides a unified error handling system using `thiserror`.
//! Storage backends report [`StorageError`]; the record layer folds those into
//! [`RecipeError`], which is what callers of [`crate::RecipeStore`] match on.

use thiserror::Error;

/// The main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    /// Recipe lifecycle errors
    #[error("Recipe error: {0}")]
    Recipe(#[from] RecipeError),

    /// Storage operation errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        /// What was misconfigured
        message: String,
    },
}

/// Errors surfaced by the recipe load/mutate/save lifecycle
#[derive(Error, Debug)]
pub enum RecipeError {
    /// No stored entry exists under this name
    #[error("Recipe not found: {name}")]
    NotFound {
        /// Name that was looked up
        name: String,
    },

    /// Any other fault in the storage layer
    #[error("Transport error: {0}")]
    Transport(#[source] StorageError),

    /// The stored body is not valid JSON or lacks a required field
    #[error("Failed to deserialize recipe {name}: {source}")]
    Deserialization {
        /// Name the body was stored under
        name: String,
        /// Decoder failure
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory recipe could not be encoded
    #[error("Failed to serialize recipe {name}: {source}")]
    Serialization {
        /// Name of the recipe being encoded
        name: String,
        /// Encoder failure
        #[source]
        source: serde_json::Error,
    },
}

impl RecipeError {
    /// Whether this error means the recipe does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, RecipeError::NotFound { .. })
    }
}

impl From<StorageError> for RecipeError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ResourceNotFound { resource } => RecipeError::NotFound { name: resource },
            other => RecipeError::Transport(other),
        }
    }
}

/// Storage-specific error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Storage backend not available
    #[error("Storage backend not available: {backend}")]
    BackendNotAvailable {
        /// Backend name, e.g. `s3`
        backend: String,
    },

    /// Storage operation failed
    #[error("Storage operation failed: {operation}: {reason}")]
    OperationFailed {
        /// Backend operation that failed
        operation: String,
        /// Underlying failure
        reason: String,
    },

    /// Authentication failed
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed {
        /// Credential failure reported by the backend
        reason: String,
    },

    /// Permission denied
    #[error("Permission denied: {resource}")]
    PermissionDenied {
        /// Key or bucket access was refused for
        resource: String,
    },

    /// Resource not found
    #[error("Resource not found: {resource}")]
    ResourceNotFound {
        /// Missing key
        resource: String,
    },

    /// Key rejected before reaching the backend
    #[error("Invalid key {key:?}: {reason}")]
    InvalidKey {
        /// Rejected key
        key: String,
        /// Why it was rejected
        reason: String,
    },

    /// Storage URL could not be mapped to a backend
    #[error("Unsupported storage URL: {url}")]
    UnsupportedUrl {
        /// URL as given
        url: String,
    },

    /// Connection error
    #[error("Connection error: {reason}")]
    ConnectionError {
        /// Transport failure
        reason: String,
    },
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

/// Convenience type alias for Recipe Results
pub type RecipeResult<T> = std::result::Result<T, RecipeError>;

/// Convenience type alias for Storage Results
pub type StorageResult<T> = std::result::Result<T, StorageError>;
