//! # Recipe Store
//!
//! Recipes persisted as JSON objects in object storage, one object per
//! recipe, keyed by the recipe's name.
//!
//! ## Features
//!
//! - **Recipe**: plain in-memory record with its `{name, instructions}` wire form
//! - **RecipeStore**: fetch, update-in-memory, save and delete over an injected backend
//! - **Storage Module**: pluggable backends (memory, local filesystem, S3)
//!
//! ## Optional Features
//!
//! - `s3`: AWS S3 storage backend
//!
//! ## Example
//!
//! ```rust
//! use recipe_store::{Recipe, RecipeStore};
//! use recipe_store::storage::MemoryStorage;
//!
//! let store = RecipeStore::new(MemoryStorage::new());
//! store.save(&Recipe::new("nachos", "Melt cheese on chips"))?;
//!
//! let updated = store.update_instructions("nachos", "Microwave chips and cheese")?;
//! // nothing is written until save
//! assert_eq!(store.get_by_name("nachos")?.instructions, "Melt cheese on chips");
//!
//! store.save(&updated)?;
//! assert_eq!(store.get_by_name("nachos")?.instructions, "Microwave chips and cheese");
//!
//! store.delete("nachos")?;
//! assert!(store.get_by_name("nachos").unwrap_err().is_not_found());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export core error types
pub use error::{Error, RecipeError, Result};

pub mod error;
pub mod logging;
pub mod recipe;
pub mod recipe_store;
pub mod storage;

pub use recipe::Recipe;
pub use recipe_store::RecipeStore;

// Re-export commonly used types
pub mod prelude {
    //! Common types and traits for convenient importing

    pub use crate::error::{Error, RecipeError, RecipeResult, Result, StorageError};
    pub use crate::recipe::Recipe;
    pub use crate::recipe_store::RecipeStore;
    pub use crate::storage::{MemoryStorage, StorageApiSync, StorageFactory};
}

/// The version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of this crate
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
