//! Error types for schema loading and plan derivation

use thiserror::Error;

use crate::graph::Diagnostics;

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GenError>;

/// Generator errors.
///
/// Every variant is fatal for the run: nothing is handed to a code builder
/// once one of these is raised.
#[derive(Error, Debug)]
pub enum GenError {
    #[error("Schema error in {node}: {message}")]
    Schema { node: String, message: String },

    #[error("Schema validation failed:\n{0}")]
    Diagnostics(Diagnostics),

    #[error("Generation error for {node}: {message}")]
    Generation { node: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config loading error: {0}")]
    ConfigLoad(#[from] config_crate::ConfigError),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl GenError {
    pub fn schema(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema { node: node.into(), message: message.into() }
    }

    pub fn generation(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation { node: node.into(), message: message.into() }
    }
}
