//! Configuration loading and management
//!
//! Handles parsing of the `tdl.toml` file in the store root.

use serde::{Deserialize, Serialize};
use std::path::Path;

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;
use crate::model::TodayWindow;
use crate::storage::CONFIG_FILE;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Store access settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Today view settings
    #[serde(default)]
    pub today: TodayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// How long to wait for the store lock before giving up
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodayConfig {
    /// Which dated items `tdl today` shows when no window is given
    #[serde(default = "default_today_window")]
    pub window: String,
}

fn default_today_window() -> String {
    "on_or_before".to_string()
}

impl Default for TodayConfig {
    fn default() -> Self {
        Self {
            window: default_today_window(),
        }
    }
}

impl TodayConfig {
    /// Configured window anchored at `date`.
    pub fn window_for(&self, date: NaiveDate) -> Result<TodayWindow> {
        TodayWindow::from_mode(&self.window, date)
            .map_err(|_| invalid_window(&self.window))
    }
}

fn invalid_window(window: &str) -> Error {
    Error::InvalidConfig(format!(
        "today.window: invalid value '{window}' (expected on|on_or_before|all)"
    ))
}

impl Config {
    /// Load configuration from a `tdl.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the store root, or return defaults
    pub fn load_from_root(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            match Self::load(&config_path) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.store.lock_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "store.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        match self.today.window.trim() {
            "on" | "on_or_before" | "all" => Ok(()),
            other => Err(invalid_window(other)),
        }
    }
}
