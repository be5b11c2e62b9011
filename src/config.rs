use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub updates: UpdateConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Backend call behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Seconds before a backend call is abandoned
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

fn default_timeout_secs() -> u64 {
    15
}

/// Where new releases are published
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// GitHub repository owner
    #[serde(default = "default_owner")]
    pub owner: String,
    /// GitHub repository name
    #[serde(default = "default_repo")]
    pub repo: String,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            repo: default_repo(),
        }
    }
}

fn default_owner() -> String {
    "Didiloy".to_string()
}

fn default_repo() -> String {
    "spotwrap-next".to_string()
}

/// Log output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset
    #[serde(default)]
    pub filter: Option<String>,
}

/// Settings database location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Override for the SQLite file path
    #[serde(default)]
    pub path: Option<String>,
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "spotwrap", "Spotwrap")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        let config_dir = dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}
