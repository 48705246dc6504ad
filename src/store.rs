//! Shared timeline store.
//!
//! One process-wide [`TimelineStore`] owns every channel's breakpoint
//! sequence and moonlight floor. It is the only state mutated from more
//! than one thread: the schedule writer replaces whole channels, the
//! bootstrap loader seeds it once, and the control loop reads it every
//! tick.
//!
//! Locking discipline: acquisition is always try-lock with a bounded
//! timeout and an `Option`/`Err` result — a miss is a valid outcome, not
//! an error to panic on. The control loop uses a zero timeout and skips
//! the tick on contention; writers wait up to their configured bound and
//! then report [`StoreError::Contention`] to their caller. Readers take
//! snapshots and release before doing anything expensive.

use std::sync::{Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use crate::timeline::{self, LightTimer, TimerSequence, ValidationError};

/// Number of physical output channels.
pub const CHANNEL_COUNT: usize = 5;

/// Interval between lock re-tries while waiting out a timeout.
const RETRY_INTERVAL: Duration = Duration::from_millis(1);

// ── Errors ────────────────────────────────────────────────────

/// Failures surfaced by store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Channel index outside `0..CHANNEL_COUNT`.
    InvalidChannel { index: usize },
    /// The lock could not be acquired within the caller's timeout.
    /// Existing state is untouched; the caller may retry.
    Contention,
    /// The candidate sequence violated a timeline invariant.
    Invalid(ValidationError),
    /// Moonlight floor outside 0..=1.
    FloorOutOfRange,
}

impl core::fmt::Display for StoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidChannel { index } => {
                write!(f, "channel {} out of range (0-{})", index, CHANNEL_COUNT - 1)
            }
            Self::Contention => write!(f, "store busy, try again"),
            Self::Invalid(e) => write!(f, "invalid timer data: {e}"),
            Self::FloorOutOfRange => write!(f, "moon floor outside 0-1"),
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(e: ValidationError) -> Self {
        Self::Invalid(e)
    }
}

// ── Store ─────────────────────────────────────────────────────

struct Inner {
    channels: [TimerSequence; CHANNEL_COUNT],
    moon_floors: [f32; CHANNEL_COUNT],
}

/// Process-wide schedule state, created once at startup and shared by
/// handle (`Arc`) with every task.
pub struct TimelineStore {
    inner: Mutex<Inner>,
    write_timeout: Duration,
}

impl TimelineStore {
    /// Seed every channel with the flat 0% default and a zero moon floor.
    ///
    /// `write_timeout` bounds how long writer-path operations wait for
    /// the lock before giving up with [`StoreError::Contention`].
    pub fn new(write_timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                channels: core::array::from_fn(|_| timeline::default_sequence()),
                moon_floors: [0.0; CHANNEL_COUNT],
            }),
            write_timeout,
        }
    }

    /// Busy-poll try-lock until `timeout` elapses.
    ///
    /// A poisoned lock is recovered via `into_inner`: mutations are
    /// whole-channel swaps, so the data stays structurally valid even if
    /// a holder panicked mid-hold.
    fn lock_within(&self, timeout: Duration) -> Option<MutexGuard<'_, Inner>> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.inner.try_lock() {
                Ok(guard) => return Some(guard),
                Err(TryLockError::Poisoned(poisoned)) => return Some(poisoned.into_inner()),
                Err(TryLockError::WouldBlock) => {}
            }
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(RETRY_INTERVAL);
        }
    }

    fn check_index(index: usize) -> Result<(), StoreError> {
        if index < CHANNEL_COUNT {
            Ok(())
        } else {
            Err(StoreError::InvalidChannel { index })
        }
    }

    // ── Writer path ───────────────────────────────────────────

    /// Validate `timers` and atomically swap them into `index`.
    ///
    /// Validation and the sequence copy happen before the lock is taken,
    /// so the critical section is a single assignment. On any error the
    /// previous sequence is left untouched.
    pub fn replace_channel(&self, index: usize, timers: &[LightTimer]) -> Result<(), StoreError> {
        Self::check_index(index)?;
        timeline::validate(timers)?;
        let sequence =
            TimerSequence::from_slice(timers).map_err(|()| ValidationError::TooManyTimers)?;

        let mut guard = self
            .lock_within(self.write_timeout)
            .ok_or(StoreError::Contention)?;
        guard.channels[index] = sequence;
        Ok(())
    }

    /// Consistent copy of a channel's sequence (writer-side timeout).
    pub fn channel_snapshot(&self, index: usize) -> Result<TimerSequence, StoreError> {
        Self::check_index(index)?;
        let guard = self
            .lock_within(self.write_timeout)
            .ok_or(StoreError::Contention)?;
        Ok(guard.channels[index].clone())
    }

    /// Set a channel's moonlight floor (fraction of full brightness).
    pub fn set_moon_floor(&self, index: usize, floor: f32) -> Result<(), StoreError> {
        Self::check_index(index)?;
        if !(0.0..=1.0).contains(&floor) {
            return Err(StoreError::FloorOutOfRange);
        }
        let mut guard = self
            .lock_within(self.write_timeout)
            .ok_or(StoreError::Contention)?;
        guard.moon_floors[index] = floor;
        Ok(())
    }

    /// Read a channel's moonlight floor.
    pub fn moon_floor(&self, index: usize) -> Result<f32, StoreError> {
        Self::check_index(index)?;
        let guard = self
            .lock_within(self.write_timeout)
            .ok_or(StoreError::Contention)?;
        Ok(guard.moon_floors[index])
    }

    /// Copy of the full state, for the persistence dumper.
    pub fn snapshot_all(
        &self,
    ) -> Result<([TimerSequence; CHANNEL_COUNT], [f32; CHANNEL_COUNT]), StoreError> {
        let guard = self
            .lock_within(self.write_timeout)
            .ok_or(StoreError::Contention)?;
        Ok((guard.channels.clone(), guard.moon_floors))
    }

    // ── Control-loop path ─────────────────────────────────────

    /// Zero-timeout read access for the control loop.
    ///
    /// `None` means a writer holds the lock right now; the caller skips
    /// this tick and the previous outputs stay in effect.
    pub fn try_read(&self) -> Option<StoreReadGuard<'_>> {
        match self.inner.try_lock() {
            Ok(guard) => Some(StoreReadGuard { guard }),
            Err(TryLockError::Poisoned(poisoned)) => Some(StoreReadGuard {
                guard: poisoned.into_inner(),
            }),
            Err(TryLockError::WouldBlock) => None,
        }
    }
}

/// Read view handed to the control loop. Held only across the per-tick
/// evaluation, never across queue publishes or I/O.
pub struct StoreReadGuard<'a> {
    guard: MutexGuard<'a, Inner>,
}

impl StoreReadGuard<'_> {
    pub fn timers(&self, index: usize) -> &[LightTimer] {
        &self.guard.channels[index]
    }

    pub fn moon_floor(&self, index: usize) -> f32 {
        self.guard.moon_floors[index]
    }
}

// ── Tests ─────────────────────────────────────────────────────
