//! Configuration management commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use crate::cli::output::{OutputFormat, or_unset, print_formatted};
use crate::config::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Get a specific config value
    Get {
        /// Config key (e.g., "backend.timeout_secs", "updates.repo")
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key (e.g., "backend.timeout_secs", "updates.repo")
        key: String,

        /// Value to set
        value: String,
    },

    /// Show config file path
    Path,
}

#[derive(Serialize)]
struct ConfigPathResult {
    path: String,
    exists: bool,
}

pub async fn run(command: ConfigCommands, config: &Config, format: OutputFormat) -> Result<()> {
    match command {
        ConfigCommands::Show => show(config, format),
        ConfigCommands::Get { key } => get(config, &key, format),
        ConfigCommands::Set { key, value } => set(config, &key, &value),
        ConfigCommands::Path => path(format),
    }
}

fn show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Text => println!("{}", toml::to_string_pretty(config)?),
    }
    Ok(())
}

fn get(config: &Config, key: &str, format: OutputFormat) -> Result<()> {
    let value = get_config_value(config, key)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&value)?),
        OutputFormat::Text => println!("{}", value),
    }
    Ok(())
}

fn get_config_value(config: &Config, key: &str) -> Result<String> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["backend", "timeout_secs"] => Ok(config.backend.timeout_secs.to_string()),
        ["updates", "owner"] => Ok(config.updates.owner.clone()),
        ["updates", "repo"] => Ok(config.updates.repo.clone()),
        ["logging", "filter"] => Ok(or_unset(config.logging.filter.as_deref().unwrap_or("")).to_string()),
        ["database", "path"] => Ok(or_unset(config.database.path.as_deref().unwrap_or("")).to_string()),
        _ => anyhow::bail!("Unknown config key: {}", key),
    }
}

fn set(config: &Config, key: &str, value: &str) -> Result<()> {
    let mut config = config.clone();

    set_config_value(&mut config, key, value)?;
    config.save()?;

    println!("Set {} = {}", key, value);
    Ok(())
}

fn set_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["backend", "timeout_secs"] => {
            config.backend.timeout_secs = value.parse()?;
        }
        ["updates", "owner"] => {
            config.updates.owner = value.to_string();
        }
        ["updates", "repo"] => {
            config.updates.repo = value.to_string();
        }
        ["logging", "filter"] => {
            config.logging.filter = (!value.is_empty()).then(|| value.to_string());
        }
        ["database", "path"] => {
            config.database.path = (!value.is_empty()).then(|| value.to_string());
        }
        _ => anyhow::bail!("Unknown config key: {}", key),
    }

    Ok(())
}

fn path(format: OutputFormat) -> Result<()> {
    let path = Config::config_path()?;
    let exists = path.exists();

    let result = ConfigPathResult {
        path: path.to_string_lossy().to_string(),
        exists,
    };

    print_formatted(&result, format, |r| {
        format!("{}{}", r.path, if r.exists { "" } else { " (not found)" })
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_set_known_keys() {
        let mut config = Config::default();
        set_config_value(&mut config, "backend.timeout_secs", "30").unwrap();
        set_config_value(&mut config, "updates.repo", "fork").unwrap();
        set_config_value(&mut config, "database.path", "/tmp/s.db").unwrap();

        assert_eq!(get_config_value(&config, "backend.timeout_secs").unwrap(), "30");
        assert_eq!(get_config_value(&config, "updates.repo").unwrap(), "fork");
        assert_eq!(get_config_value(&config, "database.path").unwrap(), "/tmp/s.db");
        assert_eq!(get_config_value(&config, "logging.filter").unwrap(), "<not set>");
    }

    #[test]
    fn test_unknown_or_invalid_values_rejected() {
        let mut config = Config::default();
        assert!(get_config_value(&config, "ui.theme").is_err());
        assert!(set_config_value(&mut config, "backend.timeout_secs", "soon").is_err());
        assert_eq!(config.backend.timeout_secs, 15);
    }
}
