//! Drum-pattern generator with a learn/mutate cycle.
//!
//! Every incoming note-on is a clock tick: the hits on the current step of
//! the current pattern are fired and the step advances. While learn mode is
//! on, incoming kit notes on the drum channel are written into the learned
//! pattern, which later becomes the source for chaotic variations. Drum
//! hits are one-shots and never get a note-off.

use cg_ir::{DrumVoice, MidiMessage, TimedEvent, DRUM_CHANNEL};

use crate::chaos::Chaos;
use crate::controls::{Controls, ParamInfo};
use crate::generator::{Generator, GeneratorInfo, GeneratorKind, RunReport};
use crate::pattern::{mutate, PatternGrid, BASE_PATTERN, STEPS};
use crate::sink::EventSink;

pub const DRUM_URI: &str = "http://github.com/danja/midi-chaos-amen";

/// Seed for the bar-end regeneration dice when the host gives none.
pub const DEFAULT_SEED: u64 = 0x5eed_a3e4;

/// Control port ids.
pub mod param {
    pub const LEARN: u16 = 0;
    pub const GROWTH_RATE: u16 = 1;
    pub const INTENSITY: u16 = 2;
    /// First of seven per-voice velocity ports, in kit order.
    pub const VELOCITY_BASE: u16 = 3;
}

static PARAMS: [ParamInfo; 10] = [
    ParamInfo::toggle(param::LEARN, "learn", "Learn mode"),
    ParamInfo::growth_rate(param::GROWTH_RATE),
    ParamInfo::intensity(param::INTENSITY, 0.3),
    ParamInfo::velocity(param::VELOCITY_BASE, "kick_velocity", "Kick velocity", 100.0),
    ParamInfo::velocity(param::VELOCITY_BASE + 1, "snare_velocity", "Snare velocity", 90.0),
    ParamInfo::velocity(param::VELOCITY_BASE + 2, "hihat_velocity", "Hi-hat velocity", 70.0),
    ParamInfo::velocity(param::VELOCITY_BASE + 3, "cowbell_velocity", "Cowbell velocity", 80.0),
    ParamInfo::velocity(param::VELOCITY_BASE + 4, "tom_low_velocity", "Low tom velocity", 85.0),
    ParamInfo::velocity(param::VELOCITY_BASE + 5, "tom_mid_velocity", "Mid tom velocity", 85.0),
    ParamInfo::velocity(param::VELOCITY_BASE + 6, "tom_high_velocity", "High tom velocity", 85.0),
];

pub static INFO: GeneratorInfo = GeneratorInfo {
    uri: DRUM_URI,
    name: "Chaos Amen",
    short_name: "drum",
    author: "chaosgen",
    kind: GeneratorKind::Drum,
    params: &PARAMS,
};

/// Velocity port for a kit voice.
pub fn velocity_param(voice: DrumVoice) -> &'static ParamInfo {
    &PARAMS[param::VELOCITY_BASE as usize + voice.index()]
}

/// Whether incoming hits are being captured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LearnState {
    Idle,
    Learning,
}

pub struct DrumGenerator {
    chaos: Chaos,
    /// Non-chaotic dice for bar-end regeneration
    rng: fastrand::Rng,
    state: LearnState,
    /// Learning has been engaged at least once this session
    engaged: bool,
    step: usize,
    learned: PatternGrid,
    current: PatternGrid,
    report: RunReport,
}

impl DrumGenerator {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            chaos: Chaos::new(),
            rng: fastrand::Rng::with_seed(seed),
            state: LearnState::Idle,
            engaged: false,
            step: 0,
            learned: BASE_PATTERN,
            current: BASE_PATTERN,
            report: RunReport::default(),
        }
    }

    pub fn state(&self) -> LearnState {
        self.state
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn learned(&self) -> &PatternGrid {
        &self.learned
    }

    pub fn current(&self) -> &PatternGrid {
        &self.current
    }

    /// Follow the learn-mode control, entering or leaving `Learning`.
    fn sync_learn_state(&mut self, controls: &Controls) {
        let learn = controls.flag(&PARAMS[param::LEARN as usize]);
        match (self.state, learn) {
            (LearnState::Idle, true) => {
                self.state = LearnState::Learning;
                self.engaged = true;
                self.learned.clear();
                self.step = 0;
                self.report.learn_changes += 1;
            }
            (LearnState::Learning, false) => {
                self.state = LearnState::Idle;
                self.report.learn_changes += 1;
            }
            _ => {}
        }
    }

    /// Capture a performed hit at the current step.
    fn learn(&mut self, channel: u8, pitch: u8) {
        if self.state != LearnState::Learning || channel != DRUM_CHANNEL {
            return;
        }
        if let Some(voice) = DrumVoice::from_note(pitch) {
            self.learned.set(voice, self.step, true);
        }
    }

    /// Rebuild the current pattern from the learned or base grid.
    ///
    /// Needs both the growth-rate and intensity controls; without them the
    /// current pattern is left as it is.
    pub fn generate_chaotic_pattern(&mut self, controls: &Controls) {
        let (Some(growth_rate), Some(intensity)) = (
            controls.get(param::GROWTH_RATE),
            controls.get(param::INTENSITY),
        ) else {
            return;
        };
        let source = if self.engaged { &self.learned } else { &BASE_PATTERN };
        self.current = mutate(source, &mut self.chaos, growth_rate as f64, intensity as f64);
        self.report.regenerations += 1;
    }

    fn fire_step(&mut self, frame: u32, controls: &Controls, sink: &mut dyn EventSink) {
        for voice in self.current.hits_at(self.step) {
            let velocity = controls.byte(velocity_param(voice));
            if sink.push(TimedEvent::note_on(frame, DRUM_CHANNEL, voice.note(), velocity)).is_err() {
                self.report.dropped += 1;
            }
        }
    }

    fn note_on(&mut self, frame: u32, channel: u8, pitch: u8, controls: &Controls, sink: &mut dyn EventSink) {
        self.learn(channel, pitch);
        self.fire_step(frame, controls, sink);

        self.step = (self.step + 1) % STEPS;
        if self.step == 0 && self.rng.u32(..4) == 0 {
            self.generate_chaotic_pattern(controls);
        }
    }
}

impl Default for DrumGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for DrumGenerator {
    fn info(&self) -> &'static GeneratorInfo {
        &INFO
    }

    fn run(&mut self, events: &[TimedEvent], controls: &Controls, sink: &mut dyn EventSink) {
        self.sync_learn_state(controls);
        for event in events {
            if let MidiMessage::NoteOn { channel, pitch, .. } = event.message {
                self.note_on(event.frame, channel, pitch, controls, sink);
            }
        }
    }

    fn all_notes_off(&mut self, _frame: u32, _sink: &mut dyn EventSink) {}

    fn sounding_count(&self) -> usize {
        0
    }

    fn take_report(&mut self) -> RunReport {
        core::mem::take(&mut self.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::BlockBuffer;

    fn learn_on() -> Controls {
        Controls::new().with(param::LEARN, 1.0)
    }

    fn clock(frame: u32) -> TimedEvent {
        TimedEvent::note_on(frame, 0, 60, 100)
    }

    #[test]
    fn starts_idle_with_base_pattern() {
        let drums = DrumGenerator::new();
        assert_eq!(drums.state(), LearnState::Idle);
        assert_eq!(drums.learned(), &BASE_PATTERN);
        assert_eq!(drums.current(), &BASE_PATTERN);
        assert_eq!(drums.step(), 0);
    }

    #[test]
    fn first_step_fires_base_hits() {
        let mut drums = DrumGenerator::new();
        let mut buf = BlockBuffer::<16>::new();
        drums.run(&[clock(3)], &Controls::new(), &mut buf);
        assert_eq!(
            buf.events(),
            &[
                TimedEvent::note_on(3, DRUM_CHANNEL, 36, 100),
                TimedEvent::note_on(3, DRUM_CHANNEL, 42, 70),
            ]
        );
        assert_eq!(drums.step(), 1);
    }

    #[test]
    fn velocity_controls_apply_per_voice() {
        let mut drums = DrumGenerator::new();
        let mut buf = BlockBuffer::<16>::new();
        let controls = Controls::new()
            .with(velocity_param(DrumVoice::Kick).id, 20.0)
            .with(velocity_param(DrumVoice::HiHat).id, 500.0);
        drums.run(&[clock(0)], &controls, &mut buf);
        assert_eq!(buf.events()[0].message, cg_ir::MidiMessage::note_on(DRUM_CHANNEL, 36, 20));
        assert_eq!(buf.events()[1].message, cg_ir::MidiMessage::note_on(DRUM_CHANNEL, 42, 127));
    }

    #[test]
    fn learn_then_replay() {
        let mut drums = DrumGenerator::new();
        let mut buf = BlockBuffer::<64>::new();

        drums.run(&[], &learn_on(), &mut buf);
        assert_eq!(drums.state(), LearnState::Learning);
        assert_eq!(drums.learned().count(), 0);

        // steps 0 and 1 pass with clock notes, step 2 gets a snare
        let snare = DrumVoice::Snare.note();
        drums.run(
            &[clock(0), clock(10), TimedEvent::note_on(20, DRUM_CHANNEL, snare, 110)],
            &learn_on(),
            &mut buf,
        );

        drums.run(&[], &Controls::new(), &mut buf);
        assert_eq!(drums.state(), LearnState::Idle);
        assert_eq!(drums.take_report().learn_changes, 2);

        assert!(drums.learned().get(DrumVoice::Snare, 2));
        assert_eq!(drums.learned().count(), 1);
    }

    #[test]
    fn learning_ignores_other_channels_and_pitches() {
        let mut drums = DrumGenerator::new();
        let mut buf = BlockBuffer::<64>::new();
        drums.run(
            &[
                TimedEvent::note_on(0, 0, DrumVoice::Kick.note(), 100),
                TimedEvent::note_on(1, DRUM_CHANNEL, 60, 100),
            ],
            &learn_on(),
            &mut buf,
        );
        assert_eq!(drums.learned().count(), 0);
    }

    #[test]
    fn entering_learn_resets_step() {
        let mut drums = DrumGenerator::new();
        let mut buf = BlockBuffer::<64>::new();
        drums.run(&[clock(0), clock(1), clock(2)], &Controls::new(), &mut buf);
        assert_eq!(drums.step(), 3);
        drums.run(&[], &learn_on(), &mut buf);
        assert_eq!(drums.step(), 0);
    }

    #[test]
    fn step_wraps_after_sixteen() {
        let mut drums = DrumGenerator::new();
        let mut buf = BlockBuffer::<512>::new();
        let clocks: Vec<TimedEvent> = (0..STEPS as u32).map(clock).collect();
        drums.run(&clocks, &Controls::new(), &mut buf);
        assert_eq!(drums.step(), 0);
        assert_eq!(buf.len(), BASE_PATTERN.count());
    }

    #[test]
    fn generation_needs_both_controls() {
        let mut drums = DrumGenerator::new();
        drums.generate_chaotic_pattern(&Controls::new().with(param::GROWTH_RATE, 3.9));
        assert_eq!(drums.current(), &BASE_PATTERN);
        drums.generate_chaotic_pattern(&Controls::new().with(param::INTENSITY, 1.0));
        assert_eq!(drums.current(), &BASE_PATTERN);
    }

    #[test]
    fn generation_uses_learned_source_once_engaged() {
        let mut drums = DrumGenerator::new();
        let mut buf = BlockBuffer::<64>::new();
        drums.run(&[], &learn_on(), &mut buf);
        drums.run(&[], &Controls::new(), &mut buf);

        // zero intensity copies the source unchanged: the empty learned grid
        let controls = Controls::new()
            .with(param::GROWTH_RATE, 3.8)
            .with(param::INTENSITY, 0.0);
        drums.generate_chaotic_pattern(&controls);
        assert_eq!(drums.current(), &PatternGrid::empty());
    }

    #[test]
    fn regeneration_happens_at_some_bar_end() {
        let mut drums = DrumGenerator::with_seed(1);
        let mut buf = BlockBuffer::<512>::new();
        let controls = Controls::new()
            .with(param::GROWTH_RATE, 3.9)
            .with(param::INTENSITY, 1.0);
        let bar: Vec<TimedEvent> = (0..STEPS as u32).map(clock).collect();
        let mut changed = false;
        for _ in 0..64 {
            buf.clear();
            drums.run(&bar, &controls, &mut buf);
            if drums.current() != &BASE_PATTERN {
                changed = true;
                break;
            }
        }
        assert!(changed);
        assert!(drums.take_report().regenerations >= 1);
    }

    #[test]
    fn hits_without_room_are_counted() {
        let mut drums = DrumGenerator::new();
        let mut buf = BlockBuffer::<1>::new();
        // step 0 of the base pattern has a kick and a hi-hat
        drums.run(&[clock(0)], &Controls::new(), &mut buf);
        assert_eq!(buf.len(), 1);
        assert_eq!(drums.take_report().dropped, 1);
    }

    #[test]
    fn drums_never_sound() {
        let mut drums = DrumGenerator::new();
        let mut buf = BlockBuffer::<64>::new();
        drums.run(&[clock(0)], &Controls::new(), &mut buf);
        buf.clear();
        drums.all_notes_off(0, &mut buf);
        assert!(buf.is_empty());
        assert_eq!(drums.sounding_count(), 0);
    }
}
