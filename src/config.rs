//! System configuration parameters
//!
//! All tunable parameters for the lumentide daemon. A JSON file can
//! override the defaults; a missing or unreadable file falls back to
//! the defaults with a log line, never an abort.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Control loop ---
    /// Dimmer evaluation rate (Hz)
    pub tick_rate_hz: u32,
    /// PWM resolution in bits
    pub pwm_bit_depth: u8,

    // --- Throttles ---
    /// Light-level telemetry publish interval (milliseconds)
    pub telemetry_interval_ms: u64,
    /// Display refresh trigger interval (milliseconds)
    pub display_interval_ms: u64,
    /// Lunar phase re-computation interval (seconds)
    pub moon_refresh_secs: u64,

    // --- Store ---
    /// How long writer-path store operations wait for the lock (milliseconds)
    pub writer_lock_timeout_ms: u64,

    // --- Persistence ---
    /// Schedule file (one block per channel, `time,percentage` lines)
    pub schedule_path: PathBuf,
    /// Moonlight floor file (one fraction per channel)
    pub moon_path: PathBuf,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Control loop
            tick_rate_hz: 100,
            pwm_bit_depth: 16,

            // Throttles
            telemetry_interval_ms: 125,
            display_interval_ms: 200,
            moon_refresh_secs: 30,

            // Store
            writer_lock_timeout_ms: 1000,

            // Persistence
            schedule_path: PathBuf::from("lighting.dat"),
            moon_path: PathBuf::from("moonlight.dat"),
        }
    }
}

impl SystemConfig {
    /// Load from a JSON file, falling back to defaults if the file is
    /// missing or malformed. Values the control loop cannot run with are
    /// replaced the same way.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<Self>(&text) {
                Ok(config) => {
                    info!("config: loaded {}", path.display());
                    config.sanitized()
                }
                Err(e) => {
                    warn!("config: {} is malformed ({e}), using defaults", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                info!("config: {} not found, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// A zero tick rate would divide the loop period by zero; treat it
    /// like a malformed file and keep the default.
    fn sanitized(mut self) -> Self {
        if self.tick_rate_hz == 0 {
            let fallback = Self::default().tick_rate_hz;
            warn!("config: tick_rate_hz 0 is invalid, using {fallback}");
            self.tick_rate_hz = fallback;
        }
        self
    }
}
