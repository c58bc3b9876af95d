//! Configuration management for LiftLog
//!
//! Settings load from a TOML file with sensible defaults, so the tools
//! work without any configuration present.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Local data settings
    #[serde(default)]
    pub data: DataConfig,
}

/// Remote API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the workout API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token for authenticated endpoints
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
        }
    }
}

/// Local data settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the logbook and other local state
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").expect("HOME environment variable not set");
            PathBuf::from(home).join(".local/share")
        })
        .join("liftlog")
}

impl Config {
    /// Load configuration from the default path, falling back to
    /// defaults when no file exists
    pub fn load() -> Result<Self> {
        let path = Self::default_config_path();
        if path.exists() {
            tracing::info!("Loading configuration from {}", path.display());
            Self::load_from(&path)
        } else {
            tracing::debug!(
                "No configuration file at {}, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Default configuration file location
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").expect("HOME environment variable not set");
                PathBuf::from(home).join(".config")
            })
            .join("liftlog")
            .join("config.toml")
    }

    /// API token, with the `LIFTLOG_TOKEN` environment variable taking
    /// precedence over the configuration file
    pub fn resolve_token(&self) -> Option<String> {
        std::env::var("LIFTLOG_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.api.token.clone())
    }
}
