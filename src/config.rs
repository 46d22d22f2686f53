//! Site configuration module.
//!
//! Handles loading and validating `atelier.toml`. All fields have defaults,
//! so a config file is optional and sparse — override just the values you
//! want:
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! database = "atelier.db"   # SQLite database file
//! media_root = "media"      # Directory sources and derivatives are written under
//! ```
//!
//! Unknown keys are rejected to catch typos early. CLI flags override file
//! values; the merge happens in `main`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `atelier.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Path of the SQLite database file.
    pub database: String,
    /// Directory media files are stored under.
    pub media_root: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            database: "atelier.db".to_string(),
            media_root: "media".to_string(),
        }
    }
}

impl SiteConfig {
    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.trim().is_empty() {
            return Err(ConfigError::Validation("database must not be empty".into()));
        }
        if self.media_root.trim().is_empty() {
            return Err(ConfigError::Validation(
                "media_root must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}
