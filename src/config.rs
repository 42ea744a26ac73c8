//! Configuration management for the generator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (typed-query.toml)
//! - Environment variables (TYPED_QUERY__*)
//!
//! ## Example config file (typed-query.toml):
//! ```toml
//! [input]
//! schema = "schema"
//! extensions = ["json"]
//!
//! [output]
//! dir = "src/generated"
//! format = "rust"
//!
//! [directives]
//! primary_key = "id"
//! selection = "selection"
//!
//! [strictness]
//! duplicate_definition = "error"
//! unresolved_interface = "warn"
//!
//! [layout.families]
//! qualification = true
//!
//! [layout.decorations.projection]
//! postfix = "Projection"
//!
//! [layout.scalars.types]
//! DateTime = "String"
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::codegen::LayoutConfiguration;
use crate::error::Result;
use crate::graph::{DirectiveLayout, LoadConfig, StrictnessConfig};

/// Main configuration for one generation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Where schema documents come from
    #[serde(default)]
    pub input: InputConfig,

    /// Where generated code goes
    #[serde(default)]
    pub output: OutputConfig,

    /// Directive names recognized in schema documents
    #[serde(default)]
    pub directives: DirectiveLayout,

    /// How schema problems are treated
    #[serde(default)]
    pub strictness: StrictnessConfig,

    /// Naming and family toggles
    #[serde(default)]
    pub layout: LayoutConfiguration,
}

/// Input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Schema document, or directory walked for documents
    #[serde(default = "default_schema_path")]
    pub schema: PathBuf,

    /// File extensions read when walking a directory
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving generated files
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// What to write
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Rust trait declarations
    #[default]
    Rust,
    /// Generation plans as pretty JSON
    Plan,
}

// Default value functions
fn default_schema_path() -> PathBuf {
    PathBuf::from("schema")
}

fn default_extensions() -> Vec<String> {
    vec!["json".to_string()]
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            schema: default_schema_path(),
            extensions: default_extensions(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            format: OutputFormat::default(),
        }
    }
}

impl GeneratorConfig {
    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = [
            "typed-query.toml",
            ".typed-query.toml",
            "config/typed-query.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "typed-query", "typed-query-gen") {
            let xdg_config = config_dir.config_dir().join("typed-query.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        // Load from environment variables (TYPED_QUERY__*)
        builder = builder.add_source(
            Environment::with_prefix("TYPED_QUERY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        tracing::debug!(
            schema = %config.input.schema.display(),
            output = %config.output.dir.display(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Loader settings derived from this configuration
    pub fn load_config(&self) -> LoadConfig {
        LoadConfig {
            directives: self.directives.clone(),
            strictness: self.strictness.clone(),
            extensions: self.input.extensions.clone(),
        }
    }

    /// Get the schema path (resolves relative paths)
    pub fn schema_path(&self) -> PathBuf {
        resolve(&self.input.schema)
    }

    /// Get the output directory (resolves relative paths)
    pub fn output_dir(&self) -> PathBuf {
        resolve(&self.output.dir)
    }
}

fn resolve(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    }
}
