//! Recipe Store
//!
//! Read access to items and recipes, plus the one write the game performs:
//! unlocking an item when it is first produced. Backends are passed to the
//! playground explicitly as `Arc<dyn RecipeStore>`.

pub mod memory;
pub mod sqlite;

use futures::future::BoxFuture;

use crate::catalog::{Item, Recipe};
use crate::error::StoreError;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub trait RecipeStore: Send + Sync {
    /// Every item of the catalog, ordered by id
    fn items(&self) -> BoxFuture<'_, Result<Vec<Item>, StoreError>>;

    /// Items the player has discovered, ordered by id
    fn unlocked_items(&self) -> BoxFuture<'_, Result<Vec<Item>, StoreError>>;

    fn item<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Item, StoreError>>;

    /// Every recipe where `item_id` is either ingredient
    fn recipes_for<'a>(&'a self, item_id: &'a str)
        -> BoxFuture<'a, Result<Vec<Recipe>, StoreError>>;

    /// Result item id of the recipe combining `a` and `b`, if any
    fn result_of<'a>(
        &'a self,
        a: &'a str,
        b: &'a str,
    ) -> BoxFuture<'a, Result<Option<String>, StoreError>>;

    /// Mark an item unlocked. Returns true if it was locked before.
    fn unlock<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<bool, StoreError>>;
}
