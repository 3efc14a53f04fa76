//! Server settings.
//!
//! Loaded once at startup and passed explicitly into the server constructor;
//! there is no process-wide mutable settings singleton.

use std::path::Path;
use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Server configuration, JSON-loadable with per-field defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Address the TCP listener binds to.
    pub bind_addr: String,
    /// Authoritative tick rate in Hz.
    pub tick_rate_hz: f64,
    /// Delay between a peer connecting and its player being spawned, giving
    /// the peer time to finish its own setup.
    pub settle_delay_ms: u64,
    /// Where new avatars appear.
    pub spawn_position: Vec3,
    /// Upper bound for a single wire frame.
    pub max_frame_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:7777".to_string(),
            tick_rate_hz: 60.0,
            settle_delay_ms: 500,
            spawn_position: Vec3::new(0.0, 2.0, 0.0),
            max_frame_bytes: vox_net::MAX_FRAME_BYTES,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. Missing fields fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Duration of one tick at the configured rate.
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz)
    }

    /// The settle delay as a [`Duration`].
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.tick_rate_hz, 60.0);
        assert_eq!(settings.tick_duration(), Duration::from_secs_f64(1.0 / 60.0));
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"tick_rate_hz": 30.0}"#).unwrap();
        assert_eq!(settings.tick_rate_hz, 30.0);
        assert_eq!(settings.settle_delay_ms, 500);
    }
}
