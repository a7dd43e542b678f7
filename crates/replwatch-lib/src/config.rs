use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Tunables shared by every widget of a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Polling interval of the binding loop.
    pub tick_interval_ms: u64,
    /// Interval used by image sequences while playing.
    pub playback_interval_ms: u64,
    /// Points kept per plotted line after decimation.
    pub max_plot_points: usize,
    /// Inputs longer than this show only their variable name.
    pub inline_value_max_len: usize,
    /// Upper slider bound when a slider widget has no explicit limits.
    pub slider_default_max: i64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 50,
            playback_interval_ms: 1,
            max_plot_points: 4096,
            inline_value_max_len: 5,
            slider_default_max: 99,
        }
    }
}

impl WatchConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn playback_interval(&self) -> Duration {
        Duration::from_millis(self.playback_interval_ms.max(1))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = WatchConfig::parse("tick_interval_ms = 30").unwrap();
        assert_eq!(config.tick_interval(), Duration::from_millis(30));
        assert_eq!(config.inline_value_max_len, 5);
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watch.toml");
        fs::write(&path, "max_plot_points = 128\nslider_default_max = 10\n").unwrap();
        let config = WatchConfig::read(&path).unwrap();
        assert_eq!(config.max_plot_points, 128);
        assert_eq!(config.slider_default_max, 10);
        assert!(WatchConfig::read(&dir.path().join("missing.toml")).is_err());
    }
}
