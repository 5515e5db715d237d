//! Timer length configuration

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default pomodoro length in minutes.
pub const DEFAULT_POMODORO_MINUTES: u64 = 25;
/// Default break length in minutes; also the default resume timeout.
pub const DEFAULT_BREAK_MINUTES: u64 = 5;

/// Read-only supplier of period lengths and the resume timeout.
///
/// Injected into the engine at construction. Lengths are re-read on every
/// transition into a pomodoro or break period, so a host may serve live
/// values from its own settings storage.
pub trait TimerSettings: Send + Sync {
    /// Length of one pomodoro in milliseconds.
    fn pomodoro_length_millis(&self) -> u64;

    /// Length of the break after a completed pomodoro in milliseconds.
    fn break_length_millis(&self) -> u64;

    /// Maximum wall-clock gap between a persisted period start and a process
    /// restart before that period is discarded instead of resumed.
    fn resume_timeout_millis(&self) -> u64;
}

/// Plain value configuration with the classic pomodoro defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    pub pomodoro_length_millis: u64,
    pub break_length_millis: u64,
    pub resume_timeout_millis: u64,
}

impl TimerConfig {
    /// Create a configuration with the default lengths (25 minute pomodoro,
    /// 5 minute break, 5 minute resume timeout).
    pub fn new() -> Self {
        Self {
            pomodoro_length_millis: DEFAULT_POMODORO_MINUTES * 60 * 1000,
            break_length_millis: DEFAULT_BREAK_MINUTES * 60 * 1000,
            resume_timeout_millis: DEFAULT_BREAK_MINUTES * 60 * 1000,
        }
    }

    /// Create a configuration from whole-minute lengths, keeping the default
    /// resume timeout.
    pub fn from_minutes(pomodoro_minutes: u64, break_minutes: u64) -> Self {
        Self {
            pomodoro_length_millis: pomodoro_minutes * 60 * 1000,
            break_length_millis: break_minutes * 60 * 1000,
            ..Self::new()
        }
    }

    /// Load configuration from a JSON file, falling back to the defaults
    /// when the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No timer config at {}, using defaults", path.display());
            return Ok(Self::new());
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read timer config from {}", path.display()))?;
        let config = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse timer config in {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize timer config")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write timer config to {}", path.display()))
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerSettings for TimerConfig {
    fn pomodoro_length_millis(&self) -> u64 {
        self.pomodoro_length_millis
    }

    fn break_length_millis(&self) -> u64 {
        self.break_length_millis
    }

    fn resume_timeout_millis(&self) -> u64 {
        self.resume_timeout_millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_lengths() {
        let config = TimerConfig::new();
        assert_eq!(config.pomodoro_length_millis, 25 * 60 * 1000);
        assert_eq!(config.break_length_millis, 5 * 60 * 1000);
        assert_eq!(config.resume_timeout_millis, 5 * 60 * 1000);
    }

    #[test]
    fn from_minutes_converts_lengths() {
        let config = TimerConfig::from_minutes(2, 1);
        assert_eq!(config.pomodoro_length_millis, 120_000);
        assert_eq!(config.break_length_millis, 60_000);
        assert_eq!(config.resume_timeout_millis, 5 * 60 * 1000);
    }

    #[test]
    fn settings_getters_return_fields() {
        let config = TimerConfig {
            pomodoro_length_millis: 2000,
            break_length_millis: 1000,
            resume_timeout_millis: 3000,
        };
        let settings: &dyn TimerSettings = &config;
        assert_eq!(settings.pomodoro_length_millis(), 2000);
        assert_eq!(settings.break_length_millis(), 1000);
        assert_eq!(settings.resume_timeout_millis(), 3000);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = TimerConfig::from_minutes(50, 10);
        config.save(&path).unwrap();

        let loaded = TimerConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = TimerConfig::load_or_default(dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, TimerConfig::new());
    }
}
