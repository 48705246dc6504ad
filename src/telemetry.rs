//! Telemetry consumer task.
//!
//! Drains [`TELEMETRY_CHANNEL`], encodes each message into its
//! line-oriented wire frame, and hands the frame to a [`TelemetrySink`].
//!
//! Wire format: a keyword line, then one value per line.
//!
//! ```text
//! LIGHT\n12.50\n0.00\n75.00\n0.00\n20.00\n
//! TEMPERATURE\n25.40\n
//! ```

use core::fmt::Write as _;

use futures_lite::future::block_on;
use log::{info, warn};

use crate::ports::TelemetrySink;
use crate::queues::{TelemetryMessage, TELEMETRY_CHANNEL};

/// Worst-case frame: `LIGHT\n` plus five `100.00\n` values.
pub const FRAME_CAPACITY: usize = 64;

fn render(
    msg: &TelemetryMessage,
    out: &mut heapless::String<FRAME_CAPACITY>,
) -> core::fmt::Result {
    match msg {
        TelemetryMessage::LightUpdate(levels) => {
            out.write_str("LIGHT\n")?;
            for level in levels {
                writeln!(out, "{level:.2}")?;
            }
        }
        TelemetryMessage::TemperatureUpdate(celsius) => {
            writeln!(out, "TEMPERATURE\n{celsius:.2}")?;
        }
    }
    Ok(())
}

/// Encode a message into its wire frame.
pub fn encode(msg: &TelemetryMessage) -> heapless::String<FRAME_CAPACITY> {
    let mut frame = heapless::String::new();
    if render(msg, &mut frame).is_err() {
        // Capacity covers the worst-case frame; reaching this means the
        // frame layout grew without FRAME_CAPACITY following.
        warn!("telemetry: frame truncated");
    }
    frame
}

/// Log-line transport, the host stand-in for a websocket broadcaster.
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn send(&mut self, frame: &str) -> bool {
        for line in frame.lines() {
            info!("telemetry: {line}");
        }
        true
    }
}

/// Consume telemetry messages forever.
pub fn run<S: TelemetrySink>(mut sink: S) -> ! {
    loop {
        let msg = block_on(TELEMETRY_CHANNEL.receive());
        if !sink.send(&encode(&msg)) {
            warn!("telemetry: transport refused frame");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_frame_layout() {
        let frame = encode(&TelemetryMessage::LightUpdate([
            12.5, 0.0, 75.0, 0.0, 100.0,
        ]));
        assert_eq!(
            frame.as_str(),
            "LIGHT\n12.50\n0.00\n75.00\n0.00\n100.00\n"
        );
    }

    #[test]
    fn temperature_frame_layout() {
        let frame = encode(&TelemetryMessage::TemperatureUpdate(25.4));
        assert_eq!(frame.as_str(), "TEMPERATURE\n25.40\n");
    }

    #[test]
    fn worst_case_frame_fits_capacity() {
        let frame = encode(&TelemetryMessage::LightUpdate([100.0; 5]));
        assert_eq!(frame.as_str(), "LIGHT\n100.00\n100.00\n100.00\n100.00\n100.00\n");
        assert!(frame.len() <= FRAME_CAPACITY);
    }
}
