//! Configuration loaded from ~/.gensynth/config.yaml.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::scheduler::{SchedulerConfig, BASE_STEPS_PER_SECOND, MAX_STEPS_PER_TICK};

/// Directory holding config, settings and the log file.
pub fn config_dir() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".gensynth");
    path
}

/// Standard config file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.yaml")
}

/// Default path for the log file.
pub fn default_log_path() -> PathBuf {
    config_dir().join("gensynth.log")
}

/// Host configuration. Every field falls back to its default when missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Plugin steps per second at playback speed 1.
    pub base_steps_per_second: f64,
    /// Catch-up cap per host callback.
    pub max_steps_per_tick: usize,
    /// Quiet time before edits are written to disk.
    pub persist_debounce_ms: u64,
    /// Multipliers the playback speed key cycles through.
    pub playback_speeds: Vec<f64>,
    /// Plugin shown when nothing valid was remembered.
    pub default_plugin: String,
    /// Override for the parameter settings file.
    pub settings_path: Option<PathBuf>,
    /// Override for the log file.
    pub log_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_steps_per_second: BASE_STEPS_PER_SECOND,
            max_steps_per_tick: MAX_STEPS_PER_TICK,
            persist_debounce_ms: 150,
            playback_speeds: vec![1.0, 2.0, 4.0, 8.0, 16.0, 32.0],
            default_plugin: "circles".into(),
            settings_path: None,
            log_path: None,
        }
    }
}

impl Config {
    /// Load config from the standard path (~/.gensynth/config.yaml).
    /// Returns Ok(None) if the file is missing or unreadable. A malformed
    /// file is returned as the error so it can be reported once logging is
    /// up, since the log path itself comes from this file.
    pub fn load() -> Result<Option<Self>, serde_yaml::Error> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, serde_yaml::Error> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_yaml(&content).map(Some),
            Err(_) => Ok(None),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            scheduler: SchedulerConfig {
                steps_per_second: self.base_steps_per_second,
                max_steps_per_tick: self.max_steps_per_tick,
            },
            persist_debounce: Duration::from_millis(self.persist_debounce_ms),
        }
    }

    /// Valid playback speeds, falling back to `[1]` when none are usable.
    pub fn playback_speeds(&self) -> Vec<f64> {
        let speeds: Vec<f64> = self
            .playback_speeds
            .iter()
            .copied()
            .filter(|speed| speed.is_finite() && *speed > 0.0)
            .collect();
        if speeds.is_empty() {
            vec![1.0]
        } else {
            speeds
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_path.clone().unwrap_or_else(default_log_path)
    }
}
