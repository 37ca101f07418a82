//! Configuration
//!
//! Playground tuning and host settings, loaded from a TOML file. Every field
//! has a default so a partial (or missing) file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::geometry::{AxisFactors, Size};

fn default_proximity() -> AxisFactors {
    AxisFactors::new(1.2, 1.0)
}

fn default_clamp() -> AxisFactors {
    AxisFactors::new(1.2, 1.0)
}

fn default_anchor() -> AxisFactors {
    AxisFactors::new(0.8, 1.6)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaygroundConfig {
    #[serde(default = "default_surface")]
    pub surface: Size,
    /// Size every token is measured at. Latched by the first token created.
    #[serde(default = "default_token_size")]
    pub token_size: Size,
    /// Reach of the intersection test, relative to the token size
    #[serde(default = "default_proximity")]
    pub proximity: AxisFactors,
    /// How much of the token must stay on the surface while moving
    #[serde(default = "default_clamp")]
    pub clamp: AxisFactors,
    /// Pointer anchor inside the token, relative to the token size. The token's
    /// top-left corner is placed at `pointer - token_size * anchor`.
    #[serde(default = "default_anchor")]
    pub anchor: AxisFactors,
    #[serde(default = "default_true")]
    pub cache_recipes: bool,
    #[serde(default = "default_merge_capacity")]
    pub merge_channel_capacity: usize,
}

fn default_surface() -> Size {
    Size::new(1080.0, 1600.0)
}

fn default_token_size() -> Size {
    Size::new(50.0, 50.0)
}

fn default_true() -> bool {
    true
}

fn default_merge_capacity() -> usize {
    256
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            surface: default_surface(),
            token_size: default_token_size(),
            proximity: default_proximity(),
            clamp: default_clamp(),
            anchor: default_anchor(),
            cache_recipes: true,
            merge_channel_capacity: default_merge_capacity(),
        }
    }
}

/// Settings for the headless host binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default)]
    pub playground: PlaygroundConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_database_url() -> String {
    "sqlite:alchemy.db?mode=rwc".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_url: default_database_url(),
            playground: PlaygroundConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }
        let config = Self::load(path)?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let toml_str = r#"
            database_url = "sqlite::memory:"

            [playground]
            surface = { width = 400.0, height = 300.0 }
            cache_recipes = false
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.playground.surface, Size::new(400.0, 300.0));
        assert!(!config.playground.cache_recipes);
        assert_eq!(config.playground.proximity, AxisFactors::new(1.2, 1.0));
        assert_eq!(config.playground.clamp, AxisFactors::new(1.2, 1.0));
        assert_eq!(config.playground.anchor, AxisFactors::new(0.8, 1.6));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("alchemy.toml")).unwrap();
        assert_eq!(config.playground.merge_channel_capacity, 256);
    }

    #[test]
    fn test_bad_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alchemy.toml");
        std::fs::write(&path, "playground = 3").unwrap();
        assert!(matches!(
            AppConfig::load_or_default(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
