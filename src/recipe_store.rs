//! Recipe lifecycle on top of a storage backend
//!
//! [`RecipeStore`] maps a [`Recipe`] to one object whose key is the recipe
//! name. Reads always go to the backend. Mutations happen on the returned
//! in-memory value and reach storage only through [`RecipeStore::save`],
//! which overwrites unconditionally: two callers that fetch, edit and save
//! the same name race, and the later save wins.

use crate::error::RecipeResult;
use crate::recipe::Recipe;
use crate::storage::StorageApiSync;
use bytes::Bytes;

/// Loads, saves and deletes recipes through an injected backend
#[derive(Debug, Clone)]
pub struct RecipeStore<S> {
    storage: S,
}

impl<S: StorageApiSync> RecipeStore<S> {
    /// Create a store over `storage`
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Backend this store reads and writes
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Look up a recipe by name
    ///
    /// # Errors
    /// - `RecipeError::NotFound` when nothing is stored under `name`
    /// - `RecipeError::Deserialization` when the stored body is malformed
    /// - `RecipeError::Transport` for any other storage fault
    pub fn get_by_name(&self, name: &str) -> RecipeResult<Recipe> {
        tracing::debug!(name, backend = ?self.storage.backend_type(), "fetching recipe");
        let body = self.storage.get(name)?;
        Recipe::from_slice(name, &body)
    }

    /// Fetch a recipe and replace its instructions in memory
    ///
    /// Nothing is written; call [`RecipeStore::save`] on the result to persist.
    pub fn update_instructions(
        &self,
        name: &str,
        new_instructions: impl Into<String>,
    ) -> RecipeResult<Recipe> {
        let mut recipe = self.get_by_name(name)?;
        recipe.instructions = new_instructions.into();
        Ok(recipe)
    }

    /// Persist `recipe` under its name, replacing whatever is stored there
    pub fn save(&self, recipe: &Recipe) -> RecipeResult<()> {
        let body = recipe.to_bytes()?;
        tracing::debug!(name = %recipe.name, bytes = body.len(), "saving recipe");
        self.storage.put(&recipe.name, Bytes::from(body))?;
        Ok(())
    }

    /// Remove the recipe stored under `name`; absent names are not an error
    pub fn delete(&self, name: &str) -> RecipeResult<()> {
        tracing::debug!(name, "deleting recipe");
        self.storage.delete(name)?;
        Ok(())
    }
}
