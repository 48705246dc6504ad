//! Daily light timeline model.
//!
//! A channel's schedule is a sequence of breakpoints over one day,
//! strictly ascending by time-of-day. Between breakpoints the brightness
//! is linearly interpolated; the moonlight floor is then composed on top
//! as a lower bound.
//!
//! ```text
//!  %
//! 100 ┤          ╭────╮
//!     │        ╱       ╲
//!  50 ┤      ╱           ╲
//!     │    ╱               ╲
//!   0 ┼──╱───────────────────╲──
//!     00:00      12:00      24:00
//! ```
//!
//! Everything here is pure: validation and evaluation take slices and
//! return values, so the whole module is testable without any store,
//! clock, or hardware.

/// Seconds in one day; the last breakpoint of every sequence sits here.
pub const DAY_SECONDS: u32 = 86_400;

/// Maximum breakpoints per channel (stack-allocated).
pub const MAX_TIMERS: usize = 64;

/// One schedule breakpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightTimer {
    /// Seconds since local midnight, 0..=86400.
    pub time: u32,
    /// Brightness in percent, 0..=100.
    pub percentage: f32,
}

/// A channel's full daily schedule.
pub type TimerSequence = heapless::Vec<LightTimer, MAX_TIMERS>;

// ── Validation ────────────────────────────────────────────────

/// Why a candidate sequence was rejected. Checked in full before any
/// mutation, so a rejected upload never partially applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Fewer than two breakpoints.
    TooFewTimers,
    /// More breakpoints than a channel can hold.
    TooManyTimers,
    /// A breakpoint's time is outside 0..=86400.
    TimeOutOfRange { index: usize },
    /// A breakpoint's percentage is outside 0..=100.
    PercentageOutOfRange { index: usize },
    /// First breakpoint is not at second 0.
    FirstNotMidnight,
    /// Last breakpoint is not at second 86400.
    LastNotDayEnd,
    /// First and last percentages differ, so the daily cycle would jump
    /// at the 24:00 → 00:00 wrap.
    BoundaryMismatch,
    /// Times are not strictly ascending (covers duplicates).
    NotAscending { index: usize },
}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooFewTimers => write!(f, "need at least 2 timers"),
            Self::TooManyTimers => write!(f, "more than {} timers", MAX_TIMERS),
            Self::TimeOutOfRange { index } => {
                write!(f, "timer {} time outside 0-{}", index, DAY_SECONDS)
            }
            Self::PercentageOutOfRange { index } => {
                write!(f, "timer {} percentage outside 0-100", index)
            }
            Self::FirstNotMidnight => write!(f, "first timer must be at 0"),
            Self::LastNotDayEnd => write!(f, "last timer must be at {}", DAY_SECONDS),
            Self::BoundaryMismatch => {
                write!(f, "first and last percentages must match")
            }
            Self::NotAscending { index } => {
                write!(f, "timer {} not strictly after its predecessor", index)
            }
        }
    }
}

/// Check every sequence invariant. Order of checks is stable so callers
/// get a deterministic first violation.
pub fn validate(timers: &[LightTimer]) -> Result<(), ValidationError> {
    if timers.len() < 2 {
        return Err(ValidationError::TooFewTimers);
    }
    if timers.len() > MAX_TIMERS {
        return Err(ValidationError::TooManyTimers);
    }

    for (index, timer) in timers.iter().enumerate() {
        if timer.time > DAY_SECONDS {
            return Err(ValidationError::TimeOutOfRange { index });
        }
        if !(0.0..=100.0).contains(&timer.percentage) {
            return Err(ValidationError::PercentageOutOfRange { index });
        }
    }

    if timers[0].time != 0 {
        return Err(ValidationError::FirstNotMidnight);
    }
    let last = timers[timers.len() - 1];
    if last.time != DAY_SECONDS {
        return Err(ValidationError::LastNotDayEnd);
    }
    if (timers[0].percentage - last.percentage).abs() > f32::EPSILON {
        return Err(ValidationError::BoundaryMismatch);
    }

    for index in 1..timers.len() {
        if timers[index].time <= timers[index - 1].time {
            return Err(ValidationError::NotAscending { index });
        }
    }

    Ok(())
}

/// The flat 0% schedule every channel boots with.
pub fn default_sequence() -> TimerSequence {
    let mut seq = TimerSequence::new();
    // Capacity is 64; two pushes cannot fail.
    let _ = seq.push(LightTimer { time: 0, percentage: 0.0 });
    let _ = seq.push(LightTimer { time: DAY_SECONDS, percentage: 0.0 });
    seq
}

// ── Evaluation ────────────────────────────────────────────────

/// Arduino-style linear remap.
pub fn mapf(x: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Interpolate a validated sequence at `elapsed_ms` since local midnight.
///
/// Finds the first breakpoint at or after `elapsed_ms` (times compared at
/// millisecond resolution), clamping to the final breakpoint on overrun.
/// Flat segments and the position at index 0 return the breakpoint value
/// directly; everything else is exact linear interpolation.
///
/// The control loop never calls this at `elapsed_ms == 0` — that tick is
/// skipped wholesale to keep the previous output over the midnight wrap.
pub fn evaluate(timers: &[LightTimer], elapsed_ms: u32) -> f32 {
    debug_assert!(timers.len() >= 2, "sequence must be validated");

    let mut idx = 0;
    while idx < timers.len() && timers[idx].time * 1000 < elapsed_ms {
        idx += 1;
    }
    if idx >= timers.len() {
        idx = timers.len() - 1;
    }

    let cur = timers[idx];
    if idx == 0 {
        return cur.percentage;
    }
    let prev = timers[idx - 1];
    if (cur.percentage - prev.percentage).abs() < f32::EPSILON {
        return cur.percentage;
    }

    mapf(
        elapsed_ms as f32,
        (prev.time * 1000) as f32,
        (cur.time * 1000) as f32,
        prev.percentage,
        cur.percentage,
    )
}

/// Compose the interpolated schedule value with the moonlight floor.
///
/// `moon_floor` is a fraction of full brightness in 0..=1; `illumination`
/// is the fraction of the lunar disc currently lit in 0..=1. The floor
/// contribution lives in percent space, so a channel never dims below its
/// lunar simulation level even when the schedule calls for near-zero.
pub fn compose(interpolated: f32, moon_floor: f32, illumination: f32) -> f32 {
    interpolated.max(moon_floor * illumination * 100.0)
}

// ── Tests ─────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(points: &[(u32, f32)]) -> TimerSequence {
        points
            .iter()
            .map(|&(time, percentage)| LightTimer { time, percentage })
            .collect()
    }

    // ── Validation ────────────────────────────────────────────

    #[test]
    fn default_sequence_is_valid() {
        assert_eq!(validate(&default_sequence()), Ok(()));
    }

    #[test]
    fn rejects_empty_and_single() {
        assert_eq!(validate(&[]), Err(ValidationError::TooFewTimers));
        let one = seq(&[(0, 0.0)]);
        assert_eq!(validate(&one), Err(ValidationError::TooFewTimers));
    }

    #[test]
    fn rejects_first_not_midnight() {
        let s = seq(&[(10, 0.0), (DAY_SECONDS, 0.0)]);
        assert_eq!(validate(&s), Err(ValidationError::FirstNotMidnight));
    }

    #[test]
    fn rejects_last_not_day_end() {
        let s = seq(&[(0, 0.0), (86_000, 0.0)]);
        assert_eq!(validate(&s), Err(ValidationError::LastNotDayEnd));
    }

    #[test]
    fn rejects_boundary_mismatch() {
        let s = seq(&[(0, 10.0), (DAY_SECONDS, 20.0)]);
        assert_eq!(validate(&s), Err(ValidationError::BoundaryMismatch));
    }

    #[test]
    fn rejects_unsorted_and_duplicates() {
        let unsorted = seq(&[(0, 0.0), (500, 50.0), (400, 60.0), (DAY_SECONDS, 0.0)]);
        assert_eq!(
            validate(&unsorted),
            Err(ValidationError::NotAscending { index: 2 })
        );
        let dup = seq(&[(0, 0.0), (500, 50.0), (500, 60.0), (DAY_SECONDS, 0.0)]);
        assert_eq!(
            validate(&dup),
            Err(ValidationError::NotAscending { index: 2 })
        );
    }

    #[test]
    fn rejects_out_of_range_values() {
        let late = seq(&[(0, 0.0), (DAY_SECONDS + 1, 0.0)]);
        assert_eq!(
            validate(&late),
            Err(ValidationError::TimeOutOfRange { index: 1 })
        );
        let hot = seq(&[(0, 0.0), (500, 101.0), (DAY_SECONDS, 0.0)]);
        assert_eq!(
            validate(&hot),
            Err(ValidationError::PercentageOutOfRange { index: 1 })
        );
        let negative = seq(&[(0, 0.0), (500, -1.0), (DAY_SECONDS, 0.0)]);
        assert_eq!(
            validate(&negative),
            Err(ValidationError::PercentageOutOfRange { index: 1 })
        );
    }

    // ── Evaluation ────────────────────────────────────────────

    #[test]
    fn triangle_midpoints() {
        let s = seq(&[(0, 0.0), (43_200, 100.0), (DAY_SECONDS, 0.0)]);
        assert!((evaluate(&s, 21_600 * 1000) - 50.0).abs() < 1e-3);
        assert!((evaluate(&s, 43_200 * 1000) - 100.0).abs() < 1e-3);
        assert!((evaluate(&s, DAY_SECONDS * 1000) - 0.0).abs() < 1e-3);
    }

    #[test]
    fn plateau_holds_flat_value() {
        let s = seq(&[(0, 0.0), (21_600, 50.0), (64_800, 50.0), (DAY_SECONDS, 0.0)]);
        // 3h into the 0→50 ramp.
        assert!((evaluate(&s, 10_800 * 1000) - 25.0).abs() < 1e-3);
        // Noon sits on the flat 50% plateau.
        assert!((evaluate(&s, 43_200 * 1000) - 50.0).abs() < 1e-3);
        // Descending edge interpolates toward 0 by 86400.
        let descending = evaluate(&s, 70_000 * 1000);
        assert!(descending < 50.0 && descending > 0.0);
        assert!((evaluate(&s, DAY_SECONDS * 1000) - 0.0).abs() < 1e-3);
    }

    #[test]
    fn at_zero_returns_first_breakpoint() {
        // Defined, even though the control loop skips this tick.
        let s = seq(&[(0, 30.0), (43_200, 80.0), (DAY_SECONDS, 30.0)]);
        assert!((evaluate(&s, 0) - 30.0).abs() < 1e-3);
    }

    #[test]
    fn overrun_clamps_to_last() {
        let s = seq(&[(0, 10.0), (DAY_SECONDS, 10.0)]);
        assert!((evaluate(&s, DAY_SECONDS * 1000) - 10.0).abs() < 1e-3);
    }

    #[test]
    fn millisecond_resolution_between_seconds() {
        let s = seq(&[(0, 0.0), (2, 100.0), (DAY_SECONDS, 0.0)]);
        // Halfway through the two-second ramp.
        assert!((evaluate(&s, 1000) - 50.0).abs() < 1e-3);
        assert!((evaluate(&s, 1500) - 75.0).abs() < 1e-3);
    }

    // ── Composition ───────────────────────────────────────────

    #[test]
    fn floor_wins_only_when_schedule_is_lower() {
        // floor 0.5 * illumination 0.2 → 10% contribution.
        assert!((compose(10.0, 0.5, 0.2) - 10.0).abs() < 1e-6);
        assert!((compose(5.0, 0.5, 0.2) - 10.0).abs() < 1e-6);
        assert!((compose(80.0, 0.5, 0.2) - 80.0).abs() < 1e-6);
    }

    #[test]
    fn new_moon_contributes_nothing() {
        assert!((compose(0.0, 1.0, 0.0) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn mapf_matches_linear_remap() {
        assert!((mapf(5.0, 0.0, 10.0, 0.0, 100.0) - 50.0).abs() < 1e-6);
        assert!((mapf(50.0, 0.0, 100.0, 0.0, 65_535.0) - 32_767.5).abs() < 1e-3);
    }
}
