//! Item and Recipe Definitions
//!
//! Defines the data structures for items and merge recipes, including TOML
//! deserialization (Raw*) and resolved versions with defaults applied.

use serde::{Deserialize, Serialize};

// ============================================================================
// Raw TOML Structures
// ============================================================================

/// Raw item definition from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawItemDefinition {
    pub display_name: Option<String>,
    pub icon: Option<String>,
    /// Starting items are unlocked from the beginning
    #[serde(default)]
    pub unlocked: bool,
}

/// Raw recipe definition from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecipeDefinition {
    pub first: String,
    pub second: String,
    pub result: String,
}

// ============================================================================
// Resolved Structures
// ============================================================================

/// An item of the catalog.
///
/// `unlocked` only ever flips from `false` to `true`; see [`Item::unlock`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub icon: String,
    #[serde(default)]
    pub unlocked: bool,
}

impl Item {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            icon: format!("item_{}", id),
            unlocked: false,
        }
    }

    /// Create a resolved Item from raw TOML data
    pub fn from_raw(id: &str, raw: &RawItemDefinition) -> Self {
        Self {
            id: id.to_string(),
            name: raw
                .display_name
                .clone()
                .unwrap_or_else(|| id.replace('_', " ")),
            icon: raw.icon.clone().unwrap_or_else(|| format!("item_{}", id)),
            unlocked: raw.unlocked,
        }
    }

    /// Mark the item unlocked. Returns true if it was locked before.
    pub fn unlock(&mut self) -> bool {
        let newly = !self.unlocked;
        self.unlocked = true;
        newly
    }
}

/// A merge recipe: two ingredients (in either order) produce one result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipe {
    pub id: String,
    pub first: String,
    pub second: String,
    pub result: String,
}

impl Recipe {
    pub fn new(id: &str, first: &str, second: &str, result: &str) -> Self {
        Self {
            id: id.to_string(),
            first: first.to_string(),
            second: second.to_string(),
            result: result.to_string(),
        }
    }

    pub fn from_raw(id: &str, raw: &RawRecipeDefinition) -> Self {
        Self::new(id, &raw.first, &raw.second, &raw.result)
    }

    /// Check if the item is either ingredient
    pub fn involves(&self, item_id: &str) -> bool {
        self.first == item_id || self.second == item_id
    }

    /// Check if the recipe combines `a` and `b`, in either order
    pub fn matches(&self, a: &str, b: &str) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_items() {
        let toml_str = r#"
            [water]
            display_name = "Water"
            icon = "drop"
            unlocked = true

            [hot_steam]
        "#;

        let parsed: HashMap<String, RawItemDefinition> = toml::from_str(toml_str).unwrap();

        let water = Item::from_raw("water", &parsed["water"]);
        assert_eq!(water.name, "Water");
        assert_eq!(water.icon, "drop");
        assert!(water.unlocked);

        let steam = Item::from_raw("hot_steam", &parsed["hot_steam"]);
        assert_eq!(steam.name, "hot steam");
        assert_eq!(steam.icon, "item_hot_steam");
        assert!(!steam.unlocked);
    }

    #[test]
    fn test_parse_recipe() {
        let toml_str = r#"
            [steam]
            first = "water"
            second = "fire"
            result = "steam"
        "#;

        let parsed: HashMap<String, RawRecipeDefinition> = toml::from_str(toml_str).unwrap();
        let recipe = Recipe::from_raw("steam", &parsed["steam"]);

        assert!(recipe.involves("water"));
        assert!(recipe.involves("fire"));
        assert!(!recipe.involves("steam"));
        assert!(recipe.matches("fire", "water"));
        assert!(recipe.matches("water", "fire"));
        assert!(!recipe.matches("water", "water"));
    }

    #[test]
    fn test_unlock_flips_once() {
        let mut item = Item::new("steam", "Steam");
        assert!(item.unlock());
        assert!(!item.unlock());
        assert!(item.unlocked);
    }
}
