//! Bass-line generator.
//!
//! Every incoming note-on becomes a candidate bass note: the chaos source
//! decides whether to play, which interval from the incoming root to use,
//! and how hard. Notes are folded into the E1–E4 register and held until
//! the next incoming note-off.

use cg_ir::{MidiMessage, TimedEvent};

use crate::chaos::Chaos;
use crate::controls::{Controls, ParamInfo};
use crate::generator::{Generator, GeneratorInfo, GeneratorKind, RunReport};
use crate::sink::EventSink;
use crate::sounding::SoundingSet;

pub const BASS_URI: &str = "http://github.com/danja/midi-bass-chaos";

/// Control port ids.
pub mod param {
    pub const GROWTH_RATE: u16 = 0;
    pub const INTENSITY: u16 = 1;
    pub const VELOCITY: u16 = 2;
    pub const CHANNEL: u16 = 3;
    pub const REGGAE: u16 = 4;
    pub const SPARSITY: u16 = 5;
}

static PARAMS: [ParamInfo; 6] = [
    ParamInfo::growth_rate(param::GROWTH_RATE),
    ParamInfo::intensity(param::INTENSITY, 0.3),
    ParamInfo::velocity(param::VELOCITY, "velocity", "Bass velocity", 90.0),
    ParamInfo::channel(param::CHANNEL),
    ParamInfo::toggle(param::REGGAE, "reggae", "Reggae mode"),
    ParamInfo::new(param::SPARSITY, "sparsity", "Trigger sparsity", 0.0, 1.0, 0.0),
];

pub static INFO: GeneratorInfo = GeneratorInfo {
    uri: BASS_URI,
    name: "Chaos Bass",
    short_name: "bass",
    author: "chaosgen",
    kind: GeneratorKind::Bass,
    params: &PARAMS,
};

/// Intervals from the root in reggae mode: root, octave down, fifth,
/// fifth down, minor third, major sixth down.
pub const REGGAE_INTERVALS: [i32; 6] = [0, -12, 7, -5, 3, -9];

/// Intervals from the root otherwise.
pub const PLAIN_INTERVALS: [i32; 7] = [0, -12, 12, 7, -5, 3, -9];

/// Lowest bass pitch (E1).
pub const REGISTER_LOW: i32 = 28;

/// Highest bass pitch (E4).
pub const REGISTER_HIGH: i32 = 64;

/// Fold a pitch by octaves into [`REGISTER_LOW`, `REGISTER_HIGH`].
pub fn fold_into_register(pitch: i32) -> u8 {
    let mut p = pitch;
    while p > REGISTER_HIGH {
        p -= 12;
    }
    while p < REGISTER_LOW {
        p += 12;
    }
    p as u8
}

/// Reggae bar position: odd eighths are off-beats.
fn is_offbeat(beat: u32) -> bool {
    beat % 8 % 2 == 1
}

pub struct BassGenerator {
    chaos: Chaos,
    /// Incoming note-ons seen so far
    beat_count: u32,
    /// Pitch of the last incoming note-on
    root: u8,
    sounding: SoundingSet,
}

impl BassGenerator {
    pub fn new() -> Self {
        Self {
            chaos: Chaos::new(),
            beat_count: 0,
            root: 60,
            sounding: SoundingSet::new(),
        }
    }

    pub fn sounding(&self) -> &SoundingSet {
        &self.sounding
    }

    pub fn root(&self) -> u8 {
        self.root
    }

    fn growth_rate(&self, controls: &Controls) -> f64 {
        controls.growth_rate(&PARAMS[param::GROWTH_RATE as usize])
    }

    fn reggae(controls: &Controls) -> bool {
        controls.flag(&PARAMS[param::REGGAE as usize])
    }

    /// Pick an interval from the active table. One chaos advance.
    pub fn select_interval(&mut self, controls: &Controls) -> i32 {
        let r = self.growth_rate(controls);
        if Self::reggae(controls) {
            *self.chaos.pick(r, &REGGAE_INTERVALS)
        } else {
            *self.chaos.pick(r, &PLAIN_INTERVALS)
        }
    }

    /// Decide whether this beat plays. One chaos advance.
    pub fn should_trigger(&mut self, controls: &Controls) -> bool {
        let x = self.chaos.advance(self.growth_rate(controls));
        let sparsity = controls.value(&PARAMS[param::SPARSITY as usize]) as f64;

        if Self::reggae(controls) {
            let offbeat = is_offbeat(self.beat_count);
            if offbeat && x > 0.3 {
                return true;
            }
            if !offbeat && x < 0.7 {
                return false;
            }
        }

        x > sparsity
    }

    /// Base velocity perturbed by chaos. One chaos advance.
    pub fn velocity(&mut self, controls: &Controls) -> u8 {
        let x = self.chaos.advance(self.growth_rate(controls));
        let base = controls.byte(&PARAMS[param::VELOCITY as usize]) as i32;
        let intensity = controls.value(&PARAMS[param::INTENSITY as usize]) as f64;
        let variation = libm::floor(x * intensity * 30.0) as i32 - 15;
        (base + variation).clamp(1, 127) as u8
    }

    fn note_on(&mut self, frame: u32, pitch: u8, controls: &Controls, sink: &mut dyn EventSink) {
        self.beat_count = self.beat_count.wrapping_add(1);
        self.root = pitch;

        if !self.should_trigger(controls) {
            return;
        }
        let interval = self.select_interval(controls);
        let bass = fold_into_register(self.root as i32 + interval);
        let velocity = self.velocity(controls);
        let channel = controls.byte(&PARAMS[param::CHANNEL as usize]);
        self.sounding.start(sink, frame, channel, bass, velocity);
    }
}

impl Default for BassGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for BassGenerator {
    fn info(&self) -> &'static GeneratorInfo {
        &INFO
    }

    fn run(&mut self, events: &[TimedEvent], controls: &Controls, sink: &mut dyn EventSink) {
        for event in events {
            match event.message {
                MidiMessage::NoteOn { pitch, .. } => {
                    self.note_on(event.frame, pitch, controls, sink);
                }
                MidiMessage::NoteOff { .. } => {
                    self.sounding.release_all(sink, event.frame);
                }
                MidiMessage::Other => {}
            }
        }
    }

    fn all_notes_off(&mut self, frame: u32, sink: &mut dyn EventSink) {
        self.sounding.release_all(sink, frame);
    }

    fn sounding_count(&self) -> usize {
        self.sounding.len()
    }

    fn take_report(&mut self) -> RunReport {
        RunReport { dropped: self.sounding.take_dropped(), ..RunReport::default() }
    }
}
