//! Fan-out queues between the control loop and its consumers.
//!
//! Two static bounded channels bridge the 100 Hz control loop to the
//! low-rate display and telemetry tasks without heap allocation:
//!
//! ```text
//! ┌──────────────┐  TelemetryMessage  ┌─────────────────┐
//! │ control loop │───────────────────▶│ telemetry task   │
//! │  (100 Hz)    │  DisplayMessage    ├─────────────────┤
//! │              │───────────────────▶│ display task     │
//! └──────────────┘                    └─────────────────┘
//! ```
//!
//! Queue-full policy: `try_send`, drop the message, log a warning. The
//! control loop never blocks on a slow consumer; a dropped update is
//! replaced by a fresher one within 125–200 ms anyway. Every publish
//! site goes through the helpers here so the policy stays uniform.
//!
//! The [`LevelBoard`] carries the per-channel output percentages that
//! the payload-less `UpdateLights` trigger tells the display to re-read.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::moon::MoonPhase;
use crate::store::CHANNEL_COUNT;

/// Depth of both fan-out queues.
pub const QUEUE_DEPTH: usize = 6;

// ── Messages ──────────────────────────────────────────────────

/// Outbound telemetry frames, one variant per wire frame kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryMessage {
    /// Current output percentage of every channel.
    LightUpdate([f32; CHANNEL_COUNT]),
    /// Water temperature in °C (produced by the external sensor task).
    TemperatureUpdate(f32),
}

/// Messages consumed by the display task.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayMessage {
    /// Re-render the light bars from the shared [`LevelBoard`].
    UpdateLights,
    /// Show a free-form system message.
    SystemMessage(heapless::String<64>),
    /// Show a temperature reading.
    Temperature(f32),
    /// Show the lunar phase.
    MoonPhase(MoonPhase),
    /// Adjust display backlight, 0..=100.
    SetBrightness(u8),
}

// ── Channels ──────────────────────────────────────────────────

/// Control loop → telemetry task.
pub static TELEMETRY_CHANNEL: Channel<CriticalSectionRawMutex, TelemetryMessage, QUEUE_DEPTH> =
    Channel::new();

/// Control loop (and external producers) → display task.
pub static DISPLAY_CHANNEL: Channel<CriticalSectionRawMutex, DisplayMessage, QUEUE_DEPTH> =
    Channel::new();

/// Enqueue a telemetry frame. Returns `false` if the queue was full and
/// the message was dropped.
pub fn publish_telemetry(msg: TelemetryMessage) -> bool {
    if TELEMETRY_CHANNEL.try_send(msg).is_err() {
        warn!("telemetry queue full, dropping update");
        return false;
    }
    true
}

/// Enqueue a display message. Same drop-on-full policy as telemetry.
pub fn publish_display(msg: DisplayMessage) -> bool {
    if DISPLAY_CHANNEL.try_send(msg).is_err() {
        warn!("display queue full, dropping message");
        return false;
    }
    true
}

// ── Level board ───────────────────────────────────────────────

/// Lock-free per-channel output percentages.
///
/// The control loop stores each channel's final percentage after every
/// evaluation; consumers read whenever they like. Cells are individually
/// atomic (f32 bits in an `AtomicU32`), which is exactly the consistency
/// the display needs — it redraws five independent bars.
pub struct LevelBoard {
    cells: [AtomicU32; CHANNEL_COUNT],
}

impl LevelBoard {
    pub fn new() -> Self {
        Self {
            cells: core::array::from_fn(|_| AtomicU32::new(0.0_f32.to_bits())),
        }
    }

    pub fn set(&self, channel: usize, percentage: f32) {
        self.cells[channel].store(percentage.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self, channel: usize) -> f32 {
        f32::from_bits(self.cells[channel].load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> [f32; CHANNEL_COUNT] {
        core::array::from_fn(|channel| self.get(channel))
    }
}

impl Default for LevelBoard {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────
