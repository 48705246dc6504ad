//! Port traits — the boundary between the scheduling core and the
//! outside world.
//!
//! ```text
//!   MoonProvider ──▶ ┌──────────────────┐ ──▶ LightOutput
//!                    │   control loop    │
//!                    └────────┬─────────┘
//!                             │ queues
//!                 DisplaySink ▼ TelemetrySink
//! ```
//!
//! The hardware PWM rig, the physical display, and the network telemetry
//! transport all live behind these traits. The core never touches them
//! directly, which keeps every scheduling path testable with mock
//! implementations.

use crate::moon::MoonPhase;
use crate::store::CHANNEL_COUNT;

// ── Output actuation ──────────────────────────────────────────

/// Write-side port: the control loop drives the PWM rig through this.
pub trait LightOutput {
    /// Largest duty value the actuator accepts (from its bit depth).
    fn max_duty(&self) -> u32;

    /// Write one channel's duty cycle, `0..=max_duty()`.
    ///
    /// Returns `false` if the hardware rejected the write. The caller
    /// logs and moves on — one failing channel must not block the rest.
    fn write_duty(&mut self, channel: usize, duty: u32) -> bool;
}

/// Why an output rig could not be brought up at boot.
///
/// Attach failures are fatal by design: running with only some channels
/// driven is not safe for the fixture, so the process halts instead of
/// entering a degraded state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputError {
    /// A channel could not be attached to its PWM peripheral.
    AttachFailed { channel: usize },
    /// The requested bit depth is outside what the peripheral supports.
    UnsupportedBitDepth { bits: u8 },
}

impl core::fmt::Display for OutputError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AttachFailed { channel } => {
                write!(f, "could not attach output channel {channel}")
            }
            Self::UnsupportedBitDepth { bits } => {
                write!(f, "unsupported PWM bit depth {bits}")
            }
        }
    }
}

// ── Moon illumination ─────────────────────────────────────────

/// Pull-side port for lunar illumination. Always returns a value; the
/// loop polls it on a coarse interval since the answer changes over
/// minutes, not milliseconds.
pub trait MoonProvider {
    fn phase(&self) -> MoonPhase;
}

// ── Consumer sinks ────────────────────────────────────────────

/// Rendering surface behind the display consumer. Implementations own
/// the actual drawing (LCD, terminal, log lines).
pub trait DisplaySink {
    /// Render the current per-channel brightness levels.
    fn light_levels(&mut self, levels: &[f32; CHANNEL_COUNT]);

    /// Show a free-form system message.
    fn system_message(&mut self, text: &str);

    /// Show a water temperature reading.
    fn temperature(&mut self, celsius: f32);

    /// Show the lunar phase.
    fn moon(&mut self, phase: &MoonPhase);

    /// Adjust the display backlight, 0..=100.
    fn brightness(&mut self, level: u8);
}

/// Transport behind the telemetry consumer (websocket broadcaster,
/// serial log, …). Frames are the line-oriented wire text.
pub trait TelemetrySink {
    /// Returns `false` if the frame could not be handed off.
    fn send(&mut self, frame: &str) -> bool;
}
