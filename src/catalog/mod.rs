//! Item Catalog
//!
//! Item and recipe definitions, loaded from TOML data files.

pub mod definition;
pub mod registry;

pub use definition::{Item, Recipe};
pub use registry::Catalog;
