//! PWM output rig.
//!
//! The control loop speaks percent; the actuator speaks duty counts at a
//! bit depth. This module owns that conversion plus the in-memory rig
//! used on hosts without LED hardware.
//!
//! A hardware-backed implementation attaches each channel to a PWM
//! peripheral in its constructor and fails the whole construction if any
//! channel cannot be attached — the daemon halts rather than driving a
//! partially-attached fixture.

use log::info;

use crate::ports::{LightOutput, OutputError};
use crate::store::CHANNEL_COUNT;
use crate::timeline::mapf;

/// Default PWM resolution. 16 bits gives imperceptible dimming steps.
pub const DEFAULT_BIT_DEPTH: u8 = 16;

/// PWM carrier frequency used by hardware rigs.
pub const PWM_FREQUENCY_HZ: u32 = 1_220;

/// Map a brightness percentage onto the actuator's duty range.
pub fn percent_to_duty(percentage: f32, max_duty: u32) -> u32 {
    let duty = mapf(percentage, 0.0, 100.0, 0.0, max_duty as f32).round();
    if duty <= 0.0 {
        0
    } else if duty >= max_duty as f32 {
        max_duty
    } else {
        duty as u32
    }
}

/// In-memory rig: tracks the last written duty per channel.
///
/// Stands in for the LED driver on development hosts and in tests; the
/// control loop cannot tell the difference through [`LightOutput`].
#[derive(Debug)]
pub struct SimPwm {
    duties: [u32; CHANNEL_COUNT],
    max_duty: u32,
}

impl SimPwm {
    /// Attach all channels. The simulated rig cannot fail to attach, but
    /// the signature matches hardware rigs, where any failure here is
    /// treated as fatal by the caller.
    pub fn attach(bit_depth: u8) -> Result<Self, OutputError> {
        if !(1..=16).contains(&bit_depth) {
            return Err(OutputError::UnsupportedBitDepth { bits: bit_depth });
        }
        info!(
            "pwm(sim): attached {} channels at {} bit / {} Hz",
            CHANNEL_COUNT, bit_depth, PWM_FREQUENCY_HZ
        );
        Ok(Self {
            duties: [0; CHANNEL_COUNT],
            max_duty: (1u32 << bit_depth) - 1,
        })
    }

    /// Last duty written to `channel`.
    pub fn duty(&self, channel: usize) -> u32 {
        self.duties[channel]
    }
}

impl LightOutput for SimPwm {
    fn max_duty(&self) -> u32 {
        self.max_duty
    }

    fn write_duty(&mut self, channel: usize, duty: u32) -> bool {
        if channel >= CHANNEL_COUNT || duty > self.max_duty {
            return false;
        }
        self.duties[channel] = duty;
        true
    }
}

// ── Tests ─────────────────────────────────────────────────────
