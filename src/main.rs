//! lumentide — multi-channel aquarium light scheduler.
//!
//! Hexagonal layout: a pure scheduling core behind port traits, fed by
//! a 100 Hz control loop, fanning out to consumer threads over bounded
//! queues.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                   │
//! │                                                            │
//! │  SimPwm          MoonClock        LogDisplay  LogTelemetry │
//! │  (LightOutput)   (MoonProvider)   (DisplaySink) (TelemetrySink)
//! │                                                            │
//! │  ─────────────── Port Trait Boundary ──────────────────    │
//! │                                                            │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │  Dimmer (100 Hz) · TimelineStore · timeline eval     │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! │                                                            │
//! │  queues (bounded fan-out) · persist (schedule files)       │
//! └───────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Module declarations ───────────────────────────────────────
mod config;
mod dimmer;
mod display;
mod moon;
mod output;
mod persist;
mod ports;
mod queues;
mod store;
mod telemetry;
mod timeline;

// ── Imports ───────────────────────────────────────────────────
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use log::{error, info, warn};

use config::SystemConfig;
use dimmer::Dimmer;
use display::LogDisplay;
use moon::MoonClock;
use output::SimPwm;
use queues::LevelBoard;
use store::TimelineStore;
use telemetry::LogTelemetry;

const CONFIG_PATH: &str = "lumentide.json";

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  lumentide v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 1. Config ─────────────────────────────────────────────
    let config = SystemConfig::load_or_default(Path::new(CONFIG_PATH));

    // ── 2. Shared state ───────────────────────────────────────
    let store = Arc::new(TimelineStore::new(Duration::from_millis(
        config.writer_lock_timeout_ms,
    )));
    let levels = Arc::new(LevelBoard::new());

    // ── 3. Persisted schedules ────────────────────────────────
    // A broken file must not keep the lights off: log it and run with
    // whatever loaded before the failure (defaults at worst).
    if let Err(e) = persist::load(&store, &config.schedule_path, &config.moon_path) {
        warn!("persisted state not fully loaded: {e}");
    }

    // ── 4. Output rig ─────────────────────────────────────────
    // Attach failure is fatal: driving a partially-attached fixture is
    // worse than not starting.
    let pwm = match SimPwm::attach(config.pwm_bit_depth) {
        Ok(pwm) => pwm,
        Err(e) => {
            error!("output rig failed to attach: {e} — exiting");
            std::process::exit(1);
        }
    };

    // ── 5. Consumer threads ───────────────────────────────────
    let display_levels = Arc::clone(&levels);
    thread::Builder::new()
        .name("display".into())
        .spawn(move || display::run(display_levels, LogDisplay))
        .map_err(|e| anyhow!("could not spawn display task: {e}"))?;

    thread::Builder::new()
        .name("telemetry".into())
        .spawn(|| telemetry::run(LogTelemetry))
        .map_err(|e| anyhow!("could not spawn telemetry task: {e}"))?;

    // ── 6. Control loop (never returns) ───────────────────────
    let dimmer = Dimmer::new(store, levels, pwm, MoonClock);
    dimmer.run(&config)
}
