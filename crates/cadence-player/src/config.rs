//! Engine tuning knobs.

use std::time::Duration;

use cadence_core::{Error, Result, Volume};
use serde::{Deserialize, Serialize};

/// Quiet period after the last position update before it is persisted.
const DEFAULT_PERSIST_DEBOUNCE_MS: u64 = 5_000;

/// Past this many seconds, "previous" restarts the current track instead.
const DEFAULT_RESTART_THRESHOLD_SECS: f64 = 3.0;

/// Playback engine configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub persist_debounce_ms: u64,
    pub restart_threshold_secs: f64,
    pub initial_volume: f32,
}

impl PlayerConfig {
    pub const fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }

    pub fn initial_volume(&self) -> Volume {
        Volume::new(self.initial_volume)
    }

    #[must_use]
    pub const fn with_persist_debounce(mut self, debounce: Duration) -> Self {
        self.persist_debounce_ms = debounce.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn with_restart_threshold(mut self, seconds: f64) -> Self {
        self.restart_threshold_secs = seconds;
        self
    }

    #[must_use]
    pub fn with_initial_volume(mut self, volume: f32) -> Self {
        self.initial_volume = volume;
        self
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.persist_debounce_ms == 0 {
            return Err(Error::Config("persist_debounce_ms must be positive".into()));
        }
        if !self.restart_threshold_secs.is_finite() || self.restart_threshold_secs < 0.0 {
            return Err(Error::Config(format!(
                "restart_threshold_secs must be a non-negative number, got {}",
                self.restart_threshold_secs
            )));
        }
        Ok(())
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            persist_debounce_ms: DEFAULT_PERSIST_DEBOUNCE_MS,
            restart_threshold_secs: DEFAULT_RESTART_THRESHOLD_SECS,
            initial_volume: 1.0,
        }
    }
}
