//! Lunar illumination model.
//!
//! Approximates the fraction of the lunar disc currently lit from the
//! mean synodic cycle: phase angle 0° at new moon, 180° at full, and
//! illuminated fraction `(1 - cos θ) / 2`. Accurate to a couple of
//! percent, which is far below what a moonlight dimming floor can
//! resolve.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::ports::MoonProvider;

/// Mean length of the synodic month in days.
const SYNODIC_MONTH_DAYS: f64 = 29.530_588_861;

/// Reference new moon: 2000-01-06 18:14 UTC.
const NEW_MOON_EPOCH_SECS: f64 = 947_182_440.0;

/// Point-in-time lunar state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoonPhase {
    /// Fraction of the disc illuminated, 0..=1.
    pub fraction: f32,
    /// Phase angle in degrees, 0..360 (0 = new, 180 = full).
    pub angle_degrees: i32,
}

/// Phase for an arbitrary unix timestamp. Pure, so the known-date tests
/// below pin the model down without touching the system clock.
pub fn phase_at(unix_secs: i64) -> MoonPhase {
    let days = (unix_secs as f64 - NEW_MOON_EPOCH_SECS) / 86_400.0;
    let mut cycle = (days / SYNODIC_MONTH_DAYS).fract();
    if cycle < 0.0 {
        cycle += 1.0;
    }

    let angle = cycle * 360.0;
    let fraction = (1.0 - angle.to_radians().cos()) / 2.0;

    MoonPhase {
        fraction: fraction as f32,
        angle_degrees: (angle.round() as i32).rem_euclid(360),
    }
}

/// System-clock backed [`MoonProvider`].
pub struct MoonClock;

impl MoonProvider for MoonClock {
    fn phase(&self) -> MoonPhase {
        let unix_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        phase_at(unix_secs)
    }
}

// ── Tests ─────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_a_new_moon() {
        let p = phase_at(NEW_MOON_EPOCH_SECS as i64);
        assert!(p.fraction < 0.001);
        assert_eq!(p.angle_degrees, 0);
    }

    #[test]
    fn new_moon_april_2024() {
        // 2024-04-08 18:21 UTC — total solar eclipse day.
        let p = phase_at(1_712_600_460);
        assert!(p.fraction < 0.05, "fraction was {}", p.fraction);
    }

    #[test]
    fn full_moon_april_2024() {
        // 2024-04-23 23:49 UTC.
        let p = phase_at(1_713_916_140);
        assert!(p.fraction > 0.95, "fraction was {}", p.fraction);
        assert!((150..=210).contains(&p.angle_degrees));
    }

    #[test]
    fn fraction_and_angle_stay_in_range() {
        // Sweep ~3 synodic months either side of the reference epoch.
        let start = NEW_MOON_EPOCH_SECS as i64 - 90 * 86_400;
        for step in 0..180 {
            let p = phase_at(start + step * 86_400);
            assert!((0.0..=1.0).contains(&p.fraction));
            assert!((0..360).contains(&p.angle_degrees));
        }
    }

    #[test]
    fn pre_epoch_timestamps_wrap_positively() {
        let p = phase_at(0);
        assert!((0.0..=1.0).contains(&p.fraction));
        assert!((0..360).contains(&p.angle_degrees));
    }
}
