use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::engine::{EngineSettings, XpTable};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_write_debounce_ms")]
    pub write_debounce_ms: u64,
    #[serde(default = "default_notification_ttl_ms")]
    pub notification_ttl_ms: u64,
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,
    #[serde(default)]
    pub xp: XpTable,
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("piggybank")
        .to_string_lossy()
        .to_string()
}
fn default_write_debounce_ms() -> u64 {
    100
}
fn default_notification_ttl_ms() -> u64 {
    5000
}
fn default_notification_capacity() -> usize {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            write_debounce_ms: default_write_debounce_ms(),
            notification_ttl_ms: default_notification_ttl_ms(),
            notification_capacity: default_notification_capacity(),
            xp: XpTable::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            let mut config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing config {}", path.display()))?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("piggybank")
            .join("config.toml")
    }

    /// Clamp timings and sizes into ranges the engine can work with.
    pub fn validate(&mut self) {
        self.write_debounce_ms = self.write_debounce_ms.min(10_000);
        self.notification_ttl_ms = self.notification_ttl_ms.clamp(500, 60_000);
        self.notification_capacity = self.notification_capacity.clamp(1, 50);
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            write_debounce: Duration::milliseconds(self.write_debounce_ms as i64),
            notification_ttl: Duration::milliseconds(self.notification_ttl_ms as i64),
            notification_capacity: self.notification_capacity,
            xp: self.xp.clone(),
        }
    }
}
