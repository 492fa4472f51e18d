//! Configuration schema (schemagraph.toml)

use serde::{Deserialize, Serialize};

use crate::additional::{AdditionalData, Override};

/// Environment variable consulted for the data source when neither the CLI
/// nor the config file names one
pub const DSN_ENV_VAR: &str = "SCHEMAGRAPH_DSN";

fn default_true() -> bool {
    true
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Data source, e.g. `json://schema.json` or `pg://user:pass@host/db`
    #[serde(default)]
    pub dsn: Option<String>,

    /// Canonicalize table and column order before output
    #[serde(default = "default_true")]
    pub sort: bool,

    /// Additional data merged into every analyzed schema
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<Override>,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: std::path::PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dsn: None,
            sort: true,
            overrides: Vec::new(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// The override document carried by this config
    pub fn additional_data(&self) -> AdditionalData {
        AdditionalData::new(self.overrides.clone())
    }

    /// Resolve the data source: explicit value, then config, then environment
    pub fn resolve_dsn(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .map(str::to_string)
            .or_else(|| self.dsn.clone())
            .or_else(|| std::env::var(DSN_ENV_VAR).ok())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
