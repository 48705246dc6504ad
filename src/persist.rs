//! Schedule and moonlight persistence.
//!
//! Schedule file layout, one block per channel:
//!
//! ```text
//! [0]
//! 0,0
//! 28800,75.5
//! ...
//! [1]
//! ...
//! ```
//!
//! The closing `86400` breakpoint is never written: its percentage is
//! required to equal the first breakpoint's, so it carries no
//! information. The loader re-synthesizes it before handing the
//! sequence to the validated replace path, which means a file can never
//! smuggle an inconsistent day boundary into the store.
//!
//! The moonlight file is one floor fraction per line, channel order.

use std::path::Path;

use log::{info, warn};

use crate::store::{StoreError, TimelineStore, CHANNEL_COUNT};
use crate::timeline::{LightTimer, TimerSequence, DAY_SECONDS};

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum PersistError {
    Io(std::io::Error),
    /// Unparseable text at the given 1-based line.
    Parse { line: usize },
    /// A channel block parsed but was rejected by the store.
    Channel { index: usize, source: StoreError },
    /// The store could not be snapshotted for saving.
    Store(StoreError),
}

impl core::fmt::Display for PersistError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "file error: {e}"),
            Self::Parse { line } => write!(f, "unparseable data at line {line}"),
            Self::Channel { index, source } => {
                write!(f, "channel {index} rejected: {source}")
            }
            Self::Store(source) => write!(f, "store unavailable: {source}"),
        }
    }
}

impl From<std::io::Error> for PersistError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ── Schedule text format ──────────────────────────────────────

/// Parse one `time,percentage` line.
pub fn parse_timer_line(line: &str) -> Option<LightTimer> {
    let (time, percentage) = line.split_once(',')?;
    Some(LightTimer {
        time: time.trim().parse().ok()?,
        percentage: percentage.trim().parse().ok()?,
    })
}

/// Render every channel into the schedule text format.
pub fn render_schedule(channels: &[TimerSequence; CHANNEL_COUNT]) -> String {
    let mut out = String::new();
    for (index, sequence) in channels.iter().enumerate() {
        out.push_str(&format!("[{index}]\n"));
        for timer in sequence.iter().filter(|t| t.time != DAY_SECONDS) {
            out.push_str(&format!("{},{}\n", timer.time, timer.percentage));
        }
    }
    out
}

/// Parse the schedule text back into per-channel sequences, with the
/// synthetic day-end breakpoint restored.
pub fn parse_schedule(text: &str) -> Result<Vec<(usize, Vec<LightTimer>)>, PersistError> {
    let mut blocks: Vec<(usize, Vec<LightTimer>)> = Vec::new();

    for (offset, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            let index = header
                .parse()
                .map_err(|_| PersistError::Parse { line: offset + 1 })?;
            blocks.push((index, Vec::new()));
        } else {
            let timer =
                parse_timer_line(line).ok_or(PersistError::Parse { line: offset + 1 })?;
            let (_, timers) = blocks
                .last_mut()
                .ok_or(PersistError::Parse { line: offset + 1 })?;
            timers.push(timer);
        }
    }

    // Re-synthesize the wrap-around breakpoint each block omits.
    for (_, timers) in &mut blocks {
        if let Some(first) = timers.first() {
            timers.push(LightTimer {
                time: DAY_SECONDS,
                percentage: first.percentage,
            });
        }
    }
    Ok(blocks)
}

// ── Moonlight text format ─────────────────────────────────────

pub fn render_floors(floors: &[f32; CHANNEL_COUNT]) -> String {
    floors.iter().map(|f| format!("{f}\n")).collect()
}

pub fn parse_floors(text: &str) -> Result<Vec<f32>, PersistError> {
    text.lines()
        .enumerate()
        .filter(|(_, raw)| !raw.trim().is_empty())
        .map(|(offset, raw)| {
            raw.trim()
                .parse()
                .map_err(|_| PersistError::Parse { line: offset + 1 })
        })
        .collect()
}

// ── File operations ───────────────────────────────────────────

/// Load both persisted files into the store. A missing file is not an
/// error — the store keeps its defaults for whatever is absent.
pub fn load(store: &TimelineStore, schedule: &Path, moonlight: &Path) -> Result<(), PersistError> {
    match std::fs::read_to_string(schedule) {
        Ok(text) => {
            for (index, timers) in parse_schedule(&text)? {
                store
                    .replace_channel(index, &timers)
                    .map_err(|source| PersistError::Channel { index, source })?;
            }
            info!("persist: loaded schedule from {}", schedule.display());
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("persist: no schedule at {}, keeping defaults", schedule.display());
        }
        Err(e) => return Err(e.into()),
    }

    match std::fs::read_to_string(moonlight) {
        Ok(text) => {
            for (index, floor) in parse_floors(&text)?.into_iter().enumerate() {
                if let Err(source) = store.set_moon_floor(index, floor) {
                    warn!("persist: moonlight entry {index} rejected: {source}");
                }
            }
            info!("persist: loaded moonlight floors from {}", moonlight.display());
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("persist: no moonlight file at {}", moonlight.display());
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Dump the store's current state to both files.
pub fn save(store: &TimelineStore, schedule: &Path, moonlight: &Path) -> Result<(), PersistError> {
    let (channels, floors) = store.snapshot_all().map_err(PersistError::Store)?;
    std::fs::write(schedule, render_schedule(&channels))?;
    std::fs::write(moonlight, render_floors(&floors))?;
    info!(
        "persist: saved {} and {}",
        schedule.display(),
        moonlight.display()
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn store_with_plateau() -> TimelineStore {
        let store = TimelineStore::new(Duration::from_millis(100));
        let timers: Vec<LightTimer> = [
            (0, 10.0),
            (21_600, 50.0),
            (64_800, 50.0),
            (DAY_SECONDS, 10.0),
        ]
        .into_iter()
        .map(|(time, percentage)| LightTimer { time, percentage })
        .collect();
        store.replace_channel(1, &timers).unwrap();
        store.set_moon_floor(1, 0.25).unwrap();
        store
    }

    #[test]
    fn render_omits_day_end_breakpoint() {
        let store = store_with_plateau();
        let (channels, _) = store.snapshot_all().unwrap();
        let text = render_schedule(&channels);
        assert!(text.contains("[1]\n0,10\n21600,50\n64800,50\n"));
        assert!(!text.contains("86400"));
    }

    #[test]
    fn parse_restores_day_end_breakpoint() {
        let blocks = parse_schedule("[0]\n0,10\n43200,90\n").unwrap();
        assert_eq!(blocks.len(), 1);
        let (index, timers) = &blocks[0];
        assert_eq!(*index, 0);
        assert_eq!(timers.len(), 3);
        assert_eq!(timers[2].time, DAY_SECONDS);
        assert!((timers[2].percentage - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn render_parse_round_trip_through_store() {
        let original = store_with_plateau();
        let (channels, _) = original.snapshot_all().unwrap();
        let text = render_schedule(&channels);

        let restored = TimelineStore::new(Duration::from_millis(100));
        for (index, timers) in parse_schedule(&text).unwrap() {
            restored.replace_channel(index, &timers).unwrap();
        }
        assert_eq!(
            restored.channel_snapshot(1).unwrap().as_slice(),
            original.channel_snapshot(1).unwrap().as_slice()
        );
    }

    #[test]
    fn garbage_lines_are_rejected_with_position() {
        let err = parse_schedule("[0]\n0,10\nnot a timer\n").unwrap_err();
        assert!(matches!(err, PersistError::Parse { line: 3 }));

        // Data before any channel header has nowhere to go.
        let err = parse_schedule("0,10\n").unwrap_err();
        assert!(matches!(err, PersistError::Parse { line: 1 }));
    }

    #[test]
    fn timer_line_parsing() {
        let t = parse_timer_line("28800, 75.5").unwrap();
        assert_eq!(t.time, 28_800);
        assert!((t.percentage - 75.5).abs() < f32::EPSILON);
        assert!(parse_timer_line("28800").is_none());
        assert!(parse_timer_line("a,b").is_none());
    }

    #[test]
    fn floors_round_trip() {
        let floors = [0.0, 0.25, 0.5, 0.0, 1.0];
        let parsed = parse_floors(&render_floors(&floors)).unwrap();
        assert_eq!(parsed.len(), CHANNEL_COUNT);
        for (a, b) in floors.iter().zip(&parsed) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn file_load_save_cycle() {
        let dir = std::env::temp_dir().join("lumentide-persist-test");
        std::fs::create_dir_all(&dir).unwrap();
        let schedule = dir.join("lighting.dat");
        let moonlight = dir.join("moonlight.dat");

        let store = store_with_plateau();
        save(&store, &schedule, &moonlight).unwrap();

        let restored = TimelineStore::new(Duration::from_millis(100));
        load(&restored, &schedule, &moonlight).unwrap();
        assert_eq!(
            restored.channel_snapshot(1).unwrap().as_slice(),
            store.channel_snapshot(1).unwrap().as_slice()
        );
        assert!((restored.moon_floor(1).unwrap() - 0.25).abs() < 1e-6);

        std::fs::remove_file(&schedule).ok();
        std::fs::remove_file(&moonlight).ok();
    }

    #[test]
    fn missing_files_keep_defaults() {
        let store = TimelineStore::new(Duration::from_millis(100));
        load(
            &store,
            Path::new("/nonexistent/lighting.dat"),
            Path::new("/nonexistent/moonlight.dat"),
        )
        .unwrap();
        assert_eq!(store.channel_snapshot(0).unwrap().len(), 2);
    }
}
