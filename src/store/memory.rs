use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::RecipeStore;
use crate::catalog::{Catalog, Item, Recipe};
use crate::error::StoreError;

/// In-process store backed by a loaded [`Catalog`]
pub struct MemoryStore {
    items: RwLock<HashMap<String, Item>>,
    /// Ordered by recipe id
    recipes: Vec<Recipe>,
}

impl MemoryStore {
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            items: RwLock::new(
                catalog
                    .items()
                    .into_iter()
                    .map(|item| (item.id.clone(), item))
                    .collect(),
            ),
            recipes: catalog.recipes(),
        }
    }

    async fn sorted_items(&self, only_unlocked: bool) -> Vec<Item> {
        let items = self.items.read().await;
        let mut out: Vec<Item> = items
            .values()
            .filter(|item| !only_unlocked || item.unlocked)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}

impl RecipeStore for MemoryStore {
    fn items(&self) -> BoxFuture<'_, Result<Vec<Item>, StoreError>> {
        async move { Ok(self.sorted_items(false).await) }.boxed()
    }

    fn unlocked_items(&self) -> BoxFuture<'_, Result<Vec<Item>, StoreError>> {
        async move { Ok(self.sorted_items(true).await) }.boxed()
    }

    fn item<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Item, StoreError>> {
        async move {
            self.items
                .read()
                .await
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::ItemNotFound(id.to_string()))
        }
        .boxed()
    }

    fn recipes_for<'a>(
        &'a self,
        item_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Recipe>, StoreError>> {
        async move {
            Ok(self
                .recipes
                .iter()
                .filter(|r| r.involves(item_id))
                .cloned()
                .collect())
        }
        .boxed()
    }

    fn result_of<'a>(
        &'a self,
        a: &'a str,
        b: &'a str,
    ) -> BoxFuture<'a, Result<Option<String>, StoreError>> {
        async move {
            Ok(self
                .recipes
                .iter()
                .find(|r| r.matches(a, b))
                .map(|r| r.result.clone()))
        }
        .boxed()
    }

    fn unlock<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<bool, StoreError>> {
        async move {
            let mut items = self.items.write().await;
            let item = items
                .get_mut(id)
                .ok_or_else(|| StoreError::ItemNotFound(id.to_string()))?;
            Ok(item.unlock())
        }
        .boxed()
    }
}
