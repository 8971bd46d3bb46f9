//! The `Recipe` record and its JSON wire form

use crate::error::{RecipeError, RecipeResult};
use serde::{Deserialize, Serialize};

/// A recipe, keyed in storage by its `name`
///
/// Plain data: constructing or mutating a `Recipe` never touches storage.
/// Persisting it is the job of [`crate::RecipeStore::save`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique name, also the storage key
    pub name: String,
    /// Free-form preparation instructions
    pub instructions: String,
}

impl Recipe {
    /// Create a recipe in memory
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
        }
    }

    /// Plain `{name, instructions}` mapping for this recipe
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "instructions": self.instructions,
        })
    }

    /// Encode the stored body
    pub fn to_bytes(&self) -> RecipeResult<Vec<u8>> {
        serde_json::to_vec(&self.to_json()).map_err(|source| RecipeError::Serialization {
            name: self.name.clone(),
            source,
        })
    }

    /// Decode a stored body read from key `name`
    ///
    /// Unknown fields are ignored; `name` and `instructions` are both required.
    pub fn from_slice(name: &str, body: &[u8]) -> RecipeResult<Self> {
        serde_json::from_slice(body).map_err(|source| RecipeError::Deserialization {
            name: name.to_string(),
            source,
        })
    }
}
