use thiserror::Error;

use crate::playground::TokenHandle;

/// Failures of the recipe store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Errors from the SQLite backend
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// The store could not be seeded from the catalog
    #[error("Catalog error: {0}")]
    Catalog(String),
}

/// Failures of playground operations
#[derive(Error, Debug)]
pub enum PlaygroundError {
    #[error("Unknown token {0}")]
    UnknownToken(TokenHandle),

    /// The token is locked by an in-flight merge
    #[error("Token {0} is merging")]
    TokenBusy(TokenHandle),

    #[error("Token {0} is not being moved")]
    NotMoving(TokenHandle),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A background resolution panicked
    #[error("Background task failed: {0}")]
    Task(String),
}

/// Failures while loading configuration files
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
