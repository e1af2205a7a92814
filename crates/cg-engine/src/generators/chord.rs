//! Chord generator with voice leading and strange key shifts.
//!
//! Each incoming note-on is the root of a new chord. The chaos source picks
//! a shape and an inversion, the voice-leading optimiser places the chord
//! near the previous one, and every fourth beat the whole progression may
//! jump by an unusual interval. Any incoming note-off releases every chord
//! tone still sounding.

use cg_ir::{MidiMessage, TimedEvent};

use crate::chaos::Chaos;
use crate::controls::{Controls, ParamInfo};
use crate::generator::{Generator, GeneratorInfo, GeneratorKind, RunReport};
use crate::sink::EventSink;
use crate::sounding::SoundingSet;
use crate::voice_leading::{Candidate, PriorVoicing};

pub const CHORD_URI: &str = "http://github.com/danja/midi-chord-chaos";

/// Control port ids.
pub mod param {
    pub const GROWTH_RATE: u16 = 0;
    pub const VELOCITY: u16 = 1;
    pub const CHANNEL: u16 = 2;
    pub const STRANGE_KEY_SHIFT: u16 = 3;
}

static PARAMS: [ParamInfo; 4] = [
    ParamInfo::growth_rate(param::GROWTH_RATE),
    ParamInfo::velocity(param::VELOCITY, "velocity", "Chord velocity", 80.0),
    ParamInfo::channel(param::CHANNEL),
    ParamInfo::toggle(param::STRANGE_KEY_SHIFT, "strange_key_shift", "Strange key shift"),
];

pub static INFO: GeneratorInfo = GeneratorInfo {
    uri: CHORD_URI,
    name: "Chaos Chords",
    short_name: "chord",
    author: "chaosgen",
    kind: GeneratorKind::Chord,
    params: &PARAMS,
};

/// A chord quality as semitone offsets from the root.
#[derive(Debug)]
pub struct ChordShape {
    pub name: &'static str,
    pub intervals: &'static [i32],
}

pub static SHAPES: [ChordShape; 8] = [
    ChordShape { name: "major", intervals: &[0, 4, 7] },
    ChordShape { name: "minor", intervals: &[0, 3, 7] },
    ChordShape { name: "maj7", intervals: &[0, 4, 7, 11] },
    ChordShape { name: "min7", intervals: &[0, 3, 7, 10] },
    ChordShape { name: "aug", intervals: &[0, 4, 8] },
    ChordShape { name: "dim", intervals: &[0, 3, 6] },
    ChordShape { name: "dom7", intervals: &[0, 4, 7, 10] },
    ChordShape { name: "sus2", intervals: &[0, 2, 7] },
];

/// Number of inversions to choose from (root position, first, second).
pub const INVERSIONS: usize = 3;

/// Tritone, minor second, major seventh and minor sixth, up then down.
pub const STRANGE_SHIFTS: [i32; 8] = [6, 1, 11, 8, -6, -1, -11, -8];

/// Beats per bar for key-shift boundaries.
pub const BEATS_PER_BAR: u32 = 4;

/// Build the raw chord tones for `root`.
///
/// The lowest `inversion` tones are raised an octave. Tones may fall
/// outside the MIDI range; the optimiser drops those.
pub fn build_chord(root: u8, shape: &ChordShape, inversion: usize, key_shift: i32) -> Candidate {
    shape
        .intervals
        .iter()
        .enumerate()
        .map(|(i, &offset)| {
            let pitch = root as i32 + offset + key_shift;
            if i < inversion {
                pitch + 12
            } else {
                pitch
            }
        })
        .collect()
}

pub struct ChordGenerator {
    chaos: Chaos,
    /// Incoming note-ons seen so far
    beat_count: u32,
    /// Semitone offset applied to every chord until the next bar redraw
    key_shift: i32,
    prior: PriorVoicing,
    sounding: SoundingSet,
    report: RunReport,
}

impl ChordGenerator {
    pub fn new() -> Self {
        Self {
            chaos: Chaos::new(),
            beat_count: 0,
            key_shift: 0,
            prior: PriorVoicing::new(),
            sounding: SoundingSet::new(),
            report: RunReport::default(),
        }
    }

    pub fn key_shift(&self) -> i32 {
        self.key_shift
    }

    pub fn prior(&self) -> &PriorVoicing {
        &self.prior
    }

    pub fn sounding(&self) -> &SoundingSet {
        &self.sounding
    }

    fn growth_rate(controls: &Controls) -> f64 {
        controls.growth_rate(&PARAMS[param::GROWTH_RATE as usize])
    }

    /// Index into [`SHAPES`]. One chaos advance.
    pub fn select_chord_type(&mut self, controls: &Controls) -> usize {
        let x = self.chaos.advance(Self::growth_rate(controls));
        crate::chaos::bucket(x, SHAPES.len())
    }

    /// Number of raised tones, 0..[`INVERSIONS`]. One chaos advance.
    pub fn select_inversion(&mut self, controls: &Controls) -> usize {
        let x = self.chaos.advance(Self::growth_rate(controls));
        crate::chaos::bucket(x, INVERSIONS)
    }

    /// Draw a new offset from [`STRANGE_SHIFTS`]. One chaos advance.
    pub fn strange_key_shift(&mut self, controls: &Controls) -> i32 {
        *self.chaos.pick(Self::growth_rate(controls), &STRANGE_SHIFTS)
    }

    /// Count the beat and redraw the key shift on bar boundaries.
    fn update_bar_tracking(&mut self, controls: &Controls) {
        self.beat_count = self.beat_count.wrapping_add(1);
        if self.beat_count % BEATS_PER_BAR == 0
            && controls.flag(&PARAMS[param::STRANGE_KEY_SHIFT as usize])
        {
            self.key_shift = self.strange_key_shift(controls);
            self.report.key_shifts += 1;
        }
    }

    fn note_on(&mut self, frame: u32, root: u8, controls: &Controls, sink: &mut dyn EventSink) {
        self.update_bar_tracking(controls);

        let shape = &SHAPES[self.select_chord_type(controls)];
        let inversion = self.select_inversion(controls);
        let candidate = build_chord(root, shape, inversion, self.key_shift);

        let Some(voicing) = self.prior.optimize(&candidate) else {
            return;
        };
        let velocity = controls.byte(&PARAMS[param::VELOCITY as usize]);
        let channel = controls.byte(&PARAMS[param::CHANNEL as usize]);
        for &pitch in &voicing {
            self.sounding.start(sink, frame, channel, pitch, velocity);
        }
    }

    fn note_off(&mut self, frame: u32, controls: &Controls, sink: &mut dyn EventSink) {
        // Shape and inversion are still drawn so the chaos stream advances
        // the same way for note-offs as for note-ons.
        let _ = self.select_chord_type(controls);
        let _ = self.select_inversion(controls);
        self.sounding.release_all(sink, frame);
    }
}

impl Default for ChordGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for ChordGenerator {
    fn info(&self) -> &'static GeneratorInfo {
        &INFO
    }

    fn run(&mut self, events: &[TimedEvent], controls: &Controls, sink: &mut dyn EventSink) {
        for event in events {
            match event.message {
                MidiMessage::NoteOn { pitch, .. } => self.note_on(event.frame, pitch, controls, sink),
                MidiMessage::NoteOff { .. } => self.note_off(event.frame, controls, sink),
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
        let mut report = core::mem::take(&mut self.report);
        report.dropped = report.dropped.saturating_add(self.sounding.take_dropped());
        report
    }
}
