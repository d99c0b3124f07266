//! Configuration management for the query console.
//!
//! Handles loading configuration from a TOML file. Every section is optional;
//! a missing file yields the defaults.

use crate::error::{ConsoleError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Row count above which the console asks before rendering a result.
pub const DEFAULT_DISPLAY_THRESHOLD: usize = 5000;

/// File name used when saving the database.
pub const DEFAULT_EXPORT_FILENAME: &str = "sql.db";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Result display settings.
    #[serde(default)]
    pub display: DisplayConfig,

    /// Database export settings.
    #[serde(default)]
    pub export: ExportConfig,

    /// Location of the state database (last query).
    #[serde(default)]
    pub state: StateConfig,
}

/// Result display settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    /// Row count of the first result above which confirmation is requested.
    #[serde(default = "default_threshold")]
    pub threshold: usize,
}

fn default_threshold() -> usize {
    DEFAULT_DISPLAY_THRESHOLD
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

/// Database export settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportConfig {
    /// Directory the exported file is written to.
    #[serde(default = "default_export_dir")]
    pub directory: PathBuf,

    /// Name of the exported file.
    #[serde(default = "default_export_filename")]
    pub filename: String,
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_export_filename() -> String {
    DEFAULT_EXPORT_FILENAME.to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: default_export_dir(),
            filename: default_export_filename(),
        }
    }
}

impl ExportConfig {
    /// Full path of the exported database file.
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }
}

/// State database settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StateConfig {
    /// Overrides the platform default state database path.
    pub path: Option<PathBuf>,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("query-console")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConsoleError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            ConsoleError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the console cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.display.threshold == 0 {
            return Err(ConsoleError::config(
                "display.threshold must be greater than zero",
            ));
        }
        if self.export.filename.trim().is_empty() {
            return Err(ConsoleError::config("export.filename must not be empty"));
        }
        Ok(())
    }

    /// Applies command-line overrides on top of the file configuration.
    pub fn with_threshold(mut self, threshold: Option<usize>) -> Result<Self> {
        if let Some(threshold) = threshold {
            self.display.threshold = threshold;
            self.validate()?;
        }
        Ok(self)
    }
}
