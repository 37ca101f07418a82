//! Recipe Resolver
//!
//! Answers "what can this item combine with" and "what do these two make"
//! on top of a [`RecipeStore`]. Recipe lists are static, so per-item lookups
//! can be cached.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use crate::catalog::{Item, Recipe};
use crate::error::StoreError;
use crate::store::RecipeStore;

pub struct RecipeResolver {
    store: Arc<dyn RecipeStore>,
    /// item id -> recipes involving it (None when caching is disabled)
    cache: Option<DashMap<String, Arc<Vec<Recipe>>>>,
}

impl RecipeResolver {
    pub fn new(store: Arc<dyn RecipeStore>, cache_recipes: bool) -> Self {
        Self {
            store,
            cache: cache_recipes.then(DashMap::new),
        }
    }

    pub fn store(&self) -> &Arc<dyn RecipeStore> {
        &self.store
    }

    /// Every recipe where `item_id` is either ingredient
    pub async fn recipes_involving(&self, item_id: &str) -> Result<Arc<Vec<Recipe>>, StoreError> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(item_id) {
                return Ok(hit.clone());
            }
        }

        let recipes = Arc::new(self.store.recipes_for(item_id).await?);
        debug!("{} recipes involve '{}'", recipes.len(), item_id);

        if let Some(cache) = &self.cache {
            cache.insert(item_id.to_string(), recipes.clone());
        }
        Ok(recipes)
    }

    /// Result of combining `a` and `b` in either order. `None` is a valid
    /// outcome, not an error.
    pub async fn result_of(&self, a: &str, b: &str) -> Result<Option<Item>, StoreError> {
        let mut result_id = self.store.result_of(a, b).await?;
        if result_id.is_none() && a != b {
            result_id = self.store.result_of(b, a).await?;
        }

        match result_id {
            Some(id) => Ok(Some(self.store.item(&id).await?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::store::MemoryStore;
    use futures::future::{BoxFuture, FutureExt};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store that only knows `first -> second` ordering and counts lookups
    struct OneWayStore {
        inner: MemoryStore,
        recipe_lookups: AtomicUsize,
    }

    impl RecipeStore for OneWayStore {
        fn items(&self) -> BoxFuture<'_, Result<Vec<Item>, StoreError>> {
            self.inner.items()
        }
        fn unlocked_items(&self) -> BoxFuture<'_, Result<Vec<Item>, StoreError>> {
            self.inner.unlocked_items()
        }
        fn item<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Item, StoreError>> {
            self.inner.item(id)
        }
        fn recipes_for<'a>(
            &'a self,
            item_id: &'a str,
        ) -> BoxFuture<'a, Result<Vec<Recipe>, StoreError>> {
            self.recipe_lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.recipes_for(item_id)
        }
        fn result_of<'a>(
            &'a self,
            a: &'a str,
            b: &'a str,
        ) -> BoxFuture<'a, Result<Option<String>, StoreError>> {
            async move {
                Ok::<_, StoreError>((a == "water" && b == "fire").then(|| "steam".to_string()))
            }
            .boxed()
        }
        fn unlock<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<bool, StoreError>> {
            self.inner.unlock(id)
        }
    }

    fn one_way_store() -> Arc<OneWayStore> {
        Arc::new(OneWayStore {
            inner: MemoryStore::new(&Catalog::from_parts(
                vec![
                    Item::new("water", "Water"),
                    Item::new("fire", "Fire"),
                    Item::new("steam", "Steam"),
                ],
                vec![Recipe::new("steam", "water", "fire", "steam")],
            )),
            recipe_lookups: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_result_is_order_independent() {
        let resolver = RecipeResolver::new(one_way_store(), false);

        let forward = resolver.result_of("water", "fire").await.unwrap();
        let backward = resolver.result_of("fire", "water").await.unwrap();
        assert_eq!(forward.unwrap().id, "steam");
        assert_eq!(backward.unwrap().id, "steam");
        assert!(resolver.result_of("fire", "fire").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recipe_cache() {
        let store = one_way_store();
        let resolver = RecipeResolver::new(store.clone(), true);

        assert_eq!(resolver.recipes_involving("water").await.unwrap().len(), 1);
        assert_eq!(resolver.recipes_involving("water").await.unwrap().len(), 1);
        assert_eq!(store.recipe_lookups.load(Ordering::SeqCst), 1);

        // Cached per item
        resolver.recipes_involving("fire").await.unwrap();
        assert_eq!(store.recipe_lookups.load(Ordering::SeqCst), 2);

        let uncached = RecipeResolver::new(store.clone(), false);
        uncached.recipes_involving("water").await.unwrap();
        uncached.recipes_involving("water").await.unwrap();
        assert_eq!(store.recipe_lookups.load(Ordering::SeqCst), 4);
    }
}
