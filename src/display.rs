//! Display consumer task.
//!
//! Drains [`DISPLAY_CHANNEL`] and renders through a [`DisplaySink`].
//! The `UpdateLights` trigger carries no payload; the task re-reads the
//! shared [`LevelBoard`] at render time, so a burst of triggers collapses
//! into drawing the freshest levels.

use std::sync::Arc;

use futures_lite::future::block_on;
use log::info;

use crate::moon::MoonPhase;
use crate::ports::DisplaySink;
use crate::queues::{DisplayMessage, LevelBoard, DISPLAY_CHANNEL};
use crate::store::CHANNEL_COUNT;

/// Log-line renderer, the host stand-in for a physical panel.
pub struct LogDisplay;

impl DisplaySink for LogDisplay {
    fn light_levels(&mut self, levels: &[f32; CHANNEL_COUNT]) {
        info!(
            "display: levels {:.1} {:.1} {:.1} {:.1} {:.1}",
            levels[0], levels[1], levels[2], levels[3], levels[4]
        );
    }

    fn system_message(&mut self, text: &str) {
        info!("display: {text}");
    }

    fn temperature(&mut self, celsius: f32) {
        info!("display: water {celsius:.1} °C");
    }

    fn moon(&mut self, phase: &MoonPhase) {
        info!(
            "display: moon {:.0}% lit ({}°)",
            phase.fraction * 100.0,
            phase.angle_degrees
        );
    }

    fn brightness(&mut self, level: u8) {
        info!("display: backlight {level}%");
    }
}

/// Consume display messages forever.
pub fn run<S: DisplaySink>(levels: Arc<LevelBoard>, mut sink: S) -> ! {
    loop {
        match block_on(DISPLAY_CHANNEL.receive()) {
            DisplayMessage::UpdateLights => sink.light_levels(&levels.snapshot()),
            DisplayMessage::SystemMessage(text) => sink.system_message(&text),
            DisplayMessage::Temperature(celsius) => sink.temperature(celsius),
            DisplayMessage::MoonPhase(phase) => sink.moon(&phase),
            DisplayMessage::SetBrightness(level) => sink.brightness(level),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        levels: Vec<[f32; CHANNEL_COUNT]>,
        messages: Vec<String>,
        brightness: Vec<u8>,
    }

    impl DisplaySink for RecordingSink {
        fn light_levels(&mut self, levels: &[f32; CHANNEL_COUNT]) {
            self.levels.push(*levels);
        }
        fn system_message(&mut self, text: &str) {
            self.messages.push(text.to_owned());
        }
        fn temperature(&mut self, _celsius: f32) {}
        fn moon(&mut self, _phase: &MoonPhase) {}
        fn brightness(&mut self, level: u8) {
            self.brightness.push(level);
        }
    }

    // run() never returns, so tests dispatch messages by hand the same
    // way the loop body does.
    fn dispatch<S: DisplaySink>(msg: DisplayMessage, levels: &LevelBoard, sink: &mut S) {
        match msg {
            DisplayMessage::UpdateLights => sink.light_levels(&levels.snapshot()),
            DisplayMessage::SystemMessage(text) => sink.system_message(&text),
            DisplayMessage::Temperature(celsius) => sink.temperature(celsius),
            DisplayMessage::MoonPhase(phase) => sink.moon(&phase),
            DisplayMessage::SetBrightness(level) => sink.brightness(level),
        }
    }

    #[test]
    fn update_lights_reads_current_board() {
        let board = LevelBoard::new();
        let mut sink = RecordingSink::default();

        board.set(0, 40.0);
        dispatch(DisplayMessage::UpdateLights, &board, &mut sink);
        board.set(0, 60.0);
        dispatch(DisplayMessage::UpdateLights, &board, &mut sink);

        assert!((sink.levels[0][0] - 40.0).abs() < f32::EPSILON);
        assert!((sink.levels[1][0] - 60.0).abs() < f32::EPSILON);
    }

    #[test]
    fn message_variants_reach_their_sink_calls() {
        let board = LevelBoard::new();
        let mut sink = RecordingSink::default();

        let mut text = heapless::String::<64>::new();
        text.push_str("schedule updated").ok();
        dispatch(DisplayMessage::SystemMessage(text), &board, &mut sink);
        dispatch(DisplayMessage::SetBrightness(80), &board, &mut sink);

        assert_eq!(sink.messages, vec!["schedule updated".to_owned()]);
        assert_eq!(sink.brightness, vec![80]);
    }
}
