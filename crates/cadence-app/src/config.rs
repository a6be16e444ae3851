//! Application configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use cadence_history::HistoryConfig;
use cadence_player::PlayerConfig;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const CONFIG_ENV: &str = "CADENCE_CONFIG";
const API_URL_ENV: &str = "CADENCE_API_URL";
const TOKEN_ENV: &str = "CADENCE_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub player: PlayerConfig,
    /// History API base URL. Without one, history lives in memory.
    pub api_url: Option<String>,
    pub token: Option<String>,
    /// Simulated playhead clock period in milliseconds.
    pub tick_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            api_url: None,
            token: None,
            tick_ms: 250,
        }
    }
}

impl AppConfig {
    /// Load from `$CADENCE_CONFIG`, then the platform config dir, then defaults,
    /// with environment overrides applied last.
    pub fn load() -> Result<Self> {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!("No config at {}, using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(
            std::env::var(API_URL_ENV).ok(),
            std::env::var(TOKEN_ENV).ok(),
        );
        config.player.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn apply_overrides(&mut self, api_url: Option<String>, token: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = Some(url);
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token);
        }
    }

    /// History API settings, if an API URL is configured.
    pub fn history(&self) -> cadence_core::Result<Option<HistoryConfig>> {
        let Some(url) = self.api_url.as_deref() else {
            return Ok(None);
        };
        let mut history = HistoryConfig::new(url)?;
        if let Some(token) = &self.token {
            history = history.with_token(token.clone());
        }
        Ok(Some(history))
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(10))
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    ProjectDirs::from("com", "cadence", "Cadence").map(|dirs| dirs.config_dir().join("config.json"))
}
