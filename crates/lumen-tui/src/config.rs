//! Configuration file management.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use lumen_core::engine::EngineConfig;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the device-control API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Period between status polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Quiet period of the interaction lock, in milliseconds
    #[serde(default = "default_quiet_period_ms")]
    pub quiet_period_ms: u64,

    /// Debounce window for the brightness slider, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_api_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_poll_interval_ms() -> u64 {
    lumen_core::engine::DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_quiet_period_ms() -> u64 {
    lumen_core::lock::DEFAULT_QUIET_PERIOD.as_millis() as u64
}

fn default_debounce_ms() -> u64 {
    lumen_core::engine::DEFAULT_DEBOUNCE_WINDOW.as_millis() as u64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            poll_interval_ms: default_poll_interval_ms(),
            quiet_period_ms: default_quiet_period_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lumen")
            .join("config.toml")
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        let path = Self::path();
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read config: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Engine timing derived from the configured values.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            quiet_period: Duration::from_millis(self.quiet_period_ms),
            debounce_window: Duration::from_millis(self.debounce_ms),
        }
    }
}
