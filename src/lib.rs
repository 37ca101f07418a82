//! Merge-detection core for a drag-and-drop alchemy game.
//!
//! Items dropped onto the [`Playground`] become tokens; when two tokens end
//! up close enough and a recipe combines them, they are replaced by the
//! recipe result. Recipes and discovery progress live behind a
//! [`RecipeStore`].

pub mod catalog;
pub mod config;
pub mod error;
pub mod geometry;
pub mod inventory;
pub mod playground;
pub mod protocol;
pub mod resolver;
pub mod store;

pub use catalog::{Catalog, Item, Recipe};
pub use config::{AppConfig, PlaygroundConfig};
pub use error::{ConfigError, PlaygroundError, StoreError};
pub use geometry::{Point, Size};
pub use inventory::Inventory;
pub use playground::{MergeEvent, MergeOutcome, Playground, ScanOutcome, TokenHandle};
pub use resolver::RecipeResolver;
pub use store::{MemoryStore, RecipeStore, SqliteStore};
