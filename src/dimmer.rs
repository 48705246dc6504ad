//! The 100 Hz dimming control loop.
//!
//! Every tick the loop reads wall-clock milliseconds since local
//! midnight, evaluates each channel's breakpoint timeline, lifts the
//! result onto the moonlight floor, and writes the duty cycle to the
//! output rig. Consumers learn about the new levels on coarse throttles
//! through the fan-out queues.
//!
//! Priorities inside a tick, in order:
//!   1. never block — the store read is zero-timeout, the publishes
//!      are drop-on-full;
//!   2. keep cadence — wake-ups are scheduled against absolute
//!      deadlines so processing time does not accumulate as drift;
//!   3. everything else (telemetry, display, moon refresh) is throttled
//!      housekeeping.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Timelike;
use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::moon::MoonPhase;
use crate::output::percent_to_duty;
use crate::ports::{LightOutput, MoonProvider};
use crate::queues::{publish_display, publish_telemetry, DisplayMessage, LevelBoard, TelemetryMessage};
use crate::store::{TimelineStore, CHANNEL_COUNT};
use crate::timeline;

/// Milliseconds elapsed since local midnight.
pub fn ms_since_midnight() -> u32 {
    let now = chrono::Local::now();
    now.num_seconds_from_midnight() * 1_000 + now.timestamp_subsec_millis()
}

/// Outcome of a single tick, for callers that care (tests, mostly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// All channels evaluated and written.
    Evaluated,
    /// Exactly midnight; outputs intentionally left untouched.
    MidnightSkip,
    /// A writer held the store; previous outputs stay in effect.
    StoreBusy,
}

/// The dimming engine. Owns the output rig and the cached lunar phase;
/// shares the timeline store and level board by handle.
pub struct Dimmer<O: LightOutput, M: MoonProvider> {
    store: Arc<TimelineStore>,
    levels: Arc<LevelBoard>,
    output: O,
    moon_provider: M,
    moon: MoonPhase,
    contention_streak: u32,
}

impl<O: LightOutput, M: MoonProvider> Dimmer<O, M> {
    pub fn new(
        store: Arc<TimelineStore>,
        levels: Arc<LevelBoard>,
        output: O,
        moon_provider: M,
    ) -> Self {
        let moon = moon_provider.phase();
        info!(
            "dimmer: initial moon phase {:.0}% lit ({}°)",
            moon.fraction * 100.0,
            moon.angle_degrees
        );
        Self {
            store,
            levels,
            output,
            moon_provider,
            moon,
            contention_streak: 0,
        }
    }

    /// Re-read the lunar phase from the provider and return it.
    pub fn refresh_moon(&mut self) -> MoonPhase {
        self.moon = self.moon_provider.phase();
        self.moon
    }

    /// The output rig, for inspection.
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Evaluate one tick at `elapsed_ms` milliseconds past midnight.
    ///
    /// Exactly 0 ms is skipped: at the midnight rollover the wall clock
    /// briefly reads zero while yesterday's last segment is still what
    /// the fixture shows, and evaluating would flash the lights before
    /// settling. The next tick lands at a nonzero offset and proceeds
    /// normally.
    pub fn step(&mut self, elapsed_ms: u32) -> TickOutcome {
        if elapsed_ms == 0 {
            return TickOutcome::MidnightSkip;
        }

        // Contention is warning-level, but a held lock spans many ticks
        // at 100 Hz: warn once per streak, demote the repeats to debug.
        let Some(view) = self.store.try_read() else {
            if self.contention_streak == 0 {
                warn!("dimmer: store busy, skipping tick");
            } else {
                debug!(
                    "dimmer: store busy, skipping tick ({} in a row)",
                    self.contention_streak + 1
                );
            }
            self.contention_streak += 1;
            return TickOutcome::StoreBusy;
        };
        self.contention_streak = 0;

        let max_duty = self.output.max_duty();
        for channel in 0..CHANNEL_COUNT {
            let interpolated = timeline::evaluate(view.timers(channel), elapsed_ms);
            let percentage =
                timeline::compose(interpolated, view.moon_floor(channel), self.moon.fraction);
            let duty = percent_to_duty(percentage, max_duty);
            if !self.output.write_duty(channel, duty) {
                warn!("dimmer: output rejected duty {duty} on channel {channel}");
            }
            self.levels.set(channel, percentage);
        }

        TickOutcome::Evaluated
    }

    /// Run the loop forever at the configured tick rate.
    pub fn run(mut self, config: &SystemConfig) -> ! {
        let period = Duration::from_micros(1_000_000 / u64::from(config.tick_rate_hz));
        let telemetry_interval = Duration::from_millis(config.telemetry_interval_ms);
        let display_interval = Duration::from_millis(config.display_interval_ms);
        let moon_interval = Duration::from_secs(config.moon_refresh_secs);

        info!(
            "dimmer: running at {} Hz (telemetry {:?}, display {:?})",
            config.tick_rate_hz, telemetry_interval, display_interval
        );

        let mut next_wake = Instant::now() + period;
        let mut last_telemetry = Instant::now();
        let mut last_display = Instant::now();
        let mut last_moon = Instant::now();

        loop {
            self.step(ms_since_midnight());

            let now = Instant::now();
            if now.duration_since(last_moon) >= moon_interval {
                last_moon = now;
                let phase = self.refresh_moon();
                publish_display(DisplayMessage::MoonPhase(phase));
            }
            if now.duration_since(last_telemetry) >= telemetry_interval {
                last_telemetry = now;
                publish_telemetry(TelemetryMessage::LightUpdate(self.levels.snapshot()));
            }
            if now.duration_since(last_display) >= display_interval {
                last_display = now;
                publish_display(DisplayMessage::UpdateLights);
            }

            // Absolute-deadline pacing. If a tick overran its slot the
            // schedule is re-anchored instead of firing a burst of
            // catch-up ticks.
            next_wake += period;
            let now = Instant::now();
            if next_wake > now {
                thread::sleep(next_wake - now);
            } else {
                next_wake = now + period;
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────
