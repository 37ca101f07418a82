use futures::future::{BoxFuture, FutureExt};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use super::RecipeStore;
use crate::catalog::{Catalog, Item, Recipe};
use crate::error::StoreError;

/// SQLite-backed store. Unlock progress survives restarts.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        // Run migrations
        Self::migrate(&pool).await?;

        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY NOT NULL,
                name TEXT NOT NULL,
                icon TEXT NOT NULL,
                unlocked INTEGER NOT NULL DEFAULT 0,
                unlocked_at DATETIME
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS recipes (
                id TEXT PRIMARY KEY NOT NULL,
                first_ingredient TEXT NOT NULL,
                second_ingredient TEXT NOT NULL,
                result TEXT NOT NULL,
                FOREIGN KEY(first_ingredient) REFERENCES items(id),
                FOREIGN KEY(second_ingredient) REFERENCES items(id),
                FOREIGN KEY(result) REFERENCES items(id)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_recipes_first ON recipes(first_ingredient)",
        )
        .execute(pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_recipes_second ON recipes(second_ingredient)",
        )
        .execute(pool)
        .await?;

        tracing::info!("Database migrations complete");
        Ok(())
    }

    /// Insert catalog items and recipes.
    ///
    /// Existing items keep their unlocked flag; display data and recipes are
    /// refreshed from the catalog.
    pub async fn seed(&self, catalog: &Catalog) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for item in catalog.items() {
            sqlx::query(
                r#"INSERT INTO items (id, name, icon, unlocked) VALUES (?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET name = excluded.name, icon = excluded.icon,
                    unlocked = MAX(items.unlocked, excluded.unlocked)"#,
            )
            .bind(&item.id)
            .bind(&item.name)
            .bind(&item.icon)
            .bind(item.unlocked)
            .execute(&mut *tx)
            .await?;
        }

        for recipe in catalog.recipes() {
            sqlx::query(
                r#"INSERT OR REPLACE INTO recipes (id, first_ingredient, second_ingredient, result)
                VALUES (?, ?, ?, ?)"#,
            )
            .bind(&recipe.id)
            .bind(&recipe.first)
            .bind(&recipe.second)
            .bind(&recipe.result)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Seeded {} items and {} recipes",
            catalog.item_count(),
            catalog.recipe_count()
        );
        Ok(())
    }

    async fn fetch_items(&self, only_unlocked: bool) -> Result<Vec<Item>, StoreError> {
        let sql = if only_unlocked {
            "SELECT id, name, icon, unlocked FROM items WHERE unlocked = 1 ORDER BY id"
        } else {
            "SELECT id, name, icon, unlocked FROM items ORDER BY id"
        };
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(item_from_row).collect())
    }
}

fn item_from_row(r: &SqliteRow) -> Item {
    Item {
        id: r.get("id"),
        name: r.get("name"),
        icon: r.get("icon"),
        unlocked: r.get("unlocked"),
    }
}

impl RecipeStore for SqliteStore {
    fn items(&self) -> BoxFuture<'_, Result<Vec<Item>, StoreError>> {
        self.fetch_items(false).boxed()
    }

    fn unlocked_items(&self) -> BoxFuture<'_, Result<Vec<Item>, StoreError>> {
        self.fetch_items(true).boxed()
    }

    fn item<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Item, StoreError>> {
        async move {
            let row = sqlx::query("SELECT id, name, icon, unlocked FROM items WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            row.as_ref()
                .map(item_from_row)
                .ok_or_else(|| StoreError::ItemNotFound(id.to_string()))
        }
        .boxed()
    }

    fn recipes_for<'a>(
        &'a self,
        item_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Recipe>, StoreError>> {
        async move {
            let rows = sqlx::query(
                r#"SELECT id, first_ingredient, second_ingredient, result FROM recipes
                WHERE first_ingredient = ? OR second_ingredient = ? ORDER BY id"#,
            )
            .bind(item_id)
            .bind(item_id)
            .fetch_all(&self.pool)
            .await?;

            Ok(rows
                .iter()
                .map(|r| Recipe {
                    id: r.get("id"),
                    first: r.get("first_ingredient"),
                    second: r.get("second_ingredient"),
                    result: r.get("result"),
                })
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
            let row = sqlx::query(
                r#"SELECT result FROM recipes
                WHERE (first_ingredient = ? AND second_ingredient = ?)
                   OR (first_ingredient = ? AND second_ingredient = ?)
                ORDER BY id LIMIT 1"#,
            )
            .bind(a)
            .bind(b)
            .bind(b)
            .bind(a)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.map(|r| r.get("result")))
        }
        .boxed()
    }

    fn unlock<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<bool, StoreError>> {
        async move {
            let result = sqlx::query(
                r#"UPDATE items SET unlocked = 1, unlocked_at = CURRENT_TIMESTAMP
                WHERE id = ? AND unlocked = 0"#,
            )
            .bind(id)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 1 {
                tracing::info!("Unlocked item: {}", id);
                return Ok(true);
            }

            // Either already unlocked or unknown
            self.item(id).await.map(|_| false)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn catalog() -> Catalog {
        let mut water = Item::new("water", "Water");
        water.unlocked = true;
        let mut fire = Item::new("fire", "Fire");
        fire.unlocked = true;
        Catalog::from_parts(
            vec![water, fire, Item::new("steam", "Steam")],
            vec![Recipe::new("steam", "water", "fire", "steam")],
        )
    }

    async fn open(dir: &TempDir) -> SqliteStore {
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("test.db").display());
        SqliteStore::new(&url).await.unwrap()
    }

    #[tokio::test]
    async fn test_seed_and_query() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;
        store.seed(&catalog()).await.unwrap();

        assert_eq!(store.items().await.unwrap().len(), 3);
        assert_eq!(store.unlocked_items().await.unwrap().len(), 2);
        assert_eq!(store.item("steam").await.unwrap().name, "Steam");
        assert_eq!(store.recipes_for("water").await.unwrap().len(), 1);
        assert_eq!(
            store.result_of("fire", "water").await.unwrap(),
            Some("steam".to_string())
        );
        assert_eq!(store.result_of("water", "water").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unlock_survives_reseed() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;
        store.seed(&catalog()).await.unwrap();

        assert!(store.unlock("steam").await.unwrap());
        assert!(!store.unlock("steam").await.unwrap());
        assert!(matches!(
            store.unlock("lava").await,
            Err(StoreError::ItemNotFound(_))
        ));

        // Reopening and reseeding keeps progress
        drop(store);
        let store = open(&dir).await;
        store.seed(&catalog()).await.unwrap();
        assert!(store.item("steam").await.unwrap().unlocked);
    }
}
