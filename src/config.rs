use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the dialogue/import backend
    pub backend_url: String,

    /// Briefr home directory
    pub briefr_home: PathBuf,

    /// UI preferences
    pub ui: UiConfig,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// How long transient status notices stay visible, in seconds
    pub notice_ttl_secs: u64,
    /// Width of the conversation sidebar, in terminal columns
    pub sidebar_width: u16,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            backend_url: "http://localhost:8000".to_string(),
            briefr_home: home.join(".briefr"),
            ui: UiConfig {
                notice_ttl_secs: 5,
                sidebar_width: 32,
            },
        }
    }
}

impl Config {
    /// Load configuration from `~/.briefr/config.toml`, falling back to
    /// defaults when the file does not exist yet.
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let briefr_home = home.join(".briefr");
        let config_path = briefr_home.join("config.toml");

        fs::create_dir_all(&briefr_home)
            .context("Failed to create .briefr directory")?;

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            toml::from_str(&content)
                .context("Failed to parse config file")?
        } else {
            Config::default()
        };

        config.briefr_home = briefr_home;

        // Environment wins over the file for the backend endpoint.
        if let Ok(url) = std::env::var("BRIEFR_BACKEND_URL") {
            if !url.trim().is_empty() {
                config.backend_url = url;
            }
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = self.briefr_home.join("config.toml");
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .context("Failed to write config file")?;
        Ok(())
    }

    /// Path of the persisted conversation store blob.
    pub fn store_path(&self) -> PathBuf {
        self.briefr_home.join("conversations.json")
    }

    /// Path of the log file; stdout belongs to the TUI.
    pub fn log_path(&self) -> PathBuf {
        self.briefr_home.join("briefr.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_local_backend() {
        let config = Config::default();
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert!(config.briefr_home.ends_with(".briefr"));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.backend_url, config.backend_url);
        assert_eq!(parsed.ui.sidebar_width, config.ui.sidebar_width);
    }
}
