//! Catalog Registry
//!
//! Loads and caches item and recipe definitions from TOML files.

use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use super::definition::{Item, RawItemDefinition, RawRecipeDefinition, Recipe};

/// Registry for all items and recipes
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: HashMap<String, Item>,
    recipes: HashMap<String, Recipe>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog directly from resolved definitions
    pub fn from_parts(items: Vec<Item>, recipes: Vec<Recipe>) -> Self {
        let mut catalog = Self::new();
        for item in items {
            catalog.items.insert(item.id.clone(), item);
        }
        for recipe in recipes {
            catalog.insert_recipe(recipe);
        }
        catalog
    }

    /// Load `items/*.toml` and then `recipes/*.toml` from a data directory
    pub fn load_from_directory(&mut self, data_dir: &Path) -> Result<(), String> {
        for (id, raw) in read_tables::<RawItemDefinition>(&data_dir.join("items"))? {
            if self.items.contains_key(&id) {
                warn!("Duplicate item ID '{}', overwriting", id);
            }
            let item = Item::from_raw(&id, &raw);
            self.items.insert(id, item);
        }
        info!("Loaded {} item definitions", self.items.len());

        for (id, raw) in read_tables::<RawRecipeDefinition>(&data_dir.join("recipes"))? {
            if self.recipes.contains_key(&id) {
                warn!("Duplicate recipe ID '{}', overwriting", id);
            }
            self.insert_recipe(Recipe::from_raw(&id, &raw));
        }
        info!("Loaded {} recipe definitions", self.recipes.len());

        Ok(())
    }

    /// Recipes must reference known items on every side
    fn insert_recipe(&mut self, recipe: Recipe) {
        for item_id in [&recipe.first, &recipe.second, &recipe.result] {
            if !self.items.contains_key(item_id) {
                warn!(
                    "Recipe '{}' references unknown item '{}', skipping",
                    recipe.id, item_id
                );
                return;
            }
        }
        self.recipes.insert(recipe.id.clone(), recipe);
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn recipe(&self, id: &str) -> Option<&Recipe> {
        self.recipes.get(id)
    }

    /// All items, ordered by id
    pub fn items(&self) -> Vec<Item> {
        let mut items: Vec<Item> = self.items.values().cloned().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        items
    }

    /// All recipes, ordered by id
    pub fn recipes(&self) -> Vec<Recipe> {
        let mut recipes: Vec<Recipe> = self.recipes.values().cloned().collect();
        recipes.sort_by(|a, b| a.id.cmp(&b.id));
        recipes
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Parse every `*.toml` file in `dir` as a table of definitions.
/// A missing directory yields nothing.
fn read_tables<T>(dir: &Path) -> Result<Vec<(String, T)>, String>
where
    T: for<'de> serde::Deserialize<'de>,
{
    if !dir.exists() {
        warn!("Data directory does not exist: {:?}", dir);
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    let entries =
        std::fs::read_dir(dir).map_err(|e| format!("Failed to read {:?}: {}", dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| format!("Failed to read entry: {}", e))?;
        let path = entry.path();
        if path.extension().map_or(false, |ext| ext == "toml") {
            paths.push(path);
        }
    }
    // Stable load order so duplicate resolution is deterministic
    paths.sort();

    let mut out = Vec::new();
    for path in paths {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
        let table: HashMap<String, T> = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse {:?}: {}", path, e))?;
        let mut entries: Vec<(String, T)> = table.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        out.extend(entries);
    }
    Ok(out)
}
