//! Bootstrap configuration loading
//!
//! Two-tier configuration: a minimal TOML file for bootstrap concerns
//! (database path, port, log filter) and the database settings table for
//! everything that can change at runtime. The TOML file cannot change
//! while the service is running.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bootstrap configuration loaded from TOML.
///
/// Minimal by design: runtime settings live in the settings table.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// tracing env-filter directive (e.g. "segue_player=debug")
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("segue.db")
}

fn default_port() -> u16 {
    5750
}

fn default_log_filter() -> String {
    "segue_player=info,segue_common=info".to_string()
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            port: default_port(),
            logging: LoggingConfig::default(),
        }
    }
}

impl BootstrapConfig {
    /// Load configuration from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Load from the platform config dir (`<config>/segue/config.toml`),
    /// falling back to built-in defaults when no file exists.
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => {
                debug!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => {
                debug!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Platform config file location.
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("segue").join("config.toml"))
}
