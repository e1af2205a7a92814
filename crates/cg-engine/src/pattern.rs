//! Drum pattern grids and chaotic mutation.

use cg_ir::{DrumVoice, DRUM_COUNT};

use crate::chaos::Chaos;

/// Steps per pattern (one bar of sixteenths).
pub const STEPS: usize = 16;

/// 7 instruments × 16 steps of hit flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatternGrid {
    cells: [[bool; STEPS]; DRUM_COUNT],
}

impl PatternGrid {
    /// A grid with no hits.
    pub const fn empty() -> Self {
        Self {
            cells: [[false; STEPS]; DRUM_COUNT],
        }
    }

    /// Build from one 16-bit row per voice; the most significant bit is
    /// step 0.
    pub const fn from_rows(rows: [u16; DRUM_COUNT]) -> Self {
        let mut cells = [[false; STEPS]; DRUM_COUNT];
        let mut drum = 0;
        while drum < DRUM_COUNT {
            let mut step = 0;
            while step < STEPS {
                cells[drum][step] = rows[drum] & (0x8000 >> step) != 0;
                step += 1;
            }
            drum += 1;
        }
        Self { cells }
    }

    /// Hit flag; steps past the end read as no hit.
    pub fn get(&self, voice: DrumVoice, step: usize) -> bool {
        self.cells[voice.index()].get(step).copied().unwrap_or(false)
    }

    /// Set a hit flag. Returns `false` if `step` is out of range.
    pub fn set(&mut self, voice: DrumVoice, step: usize, hit: bool) -> bool {
        match self.cells[voice.index()].get_mut(step) {
            Some(cell) => {
                *cell = hit;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::empty();
    }

    /// Voices that hit on `step`, in kit order.
    pub fn hits_at(&self, step: usize) -> impl Iterator<Item = DrumVoice> + '_ {
        DrumVoice::ALL.into_iter().filter(move |&v| self.get(v, step))
    }

    /// Total number of hits.
    pub fn count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&hit| hit).count()
    }
}

/// The default break every session starts from.
pub static BASE_PATTERN: PatternGrid = PatternGrid::from_rows([
    0b1000_0010_0100_0000, // kick
    0b0000_1000_0000_1010, // snare
    0b1111_1111_1111_1111, // hihat
    0b0010_0001_0010_0000, // cowbell
    0b0000_0000_1000_0000, // tom low
    0b0000_0000_0001_0000, // tom mid
    0b0001_0000_0000_0100, // tom high
]);

/// Chance scale for adding a hit to `voice`: later kit pieces are more
/// eager to appear.
pub fn add_threshold(voice: DrumVoice) -> f64 {
    0.3 + voice.index() as f64 * 0.1
}

/// Derive a new pattern from `source` by chaos-driven flips.
///
/// Walks steps in order and, within each step, voices in kit order,
/// consuming one chaos advance per cell. An empty cell turns on when the
/// value is below `intensity × add_threshold`; a hit turns off when the
/// value is above `1 − intensity × 0.15`.
pub fn mutate(source: &PatternGrid, chaos: &mut Chaos, growth_rate: f64, intensity: f64) -> PatternGrid {
    let intensity = intensity.clamp(0.0, 1.0);
    let mut current = *source;
    for step in 0..STEPS {
        for voice in DrumVoice::ALL {
            let x = chaos.advance(growth_rate);
            let hit = source.get(voice, step);
            if !hit && x < intensity * add_threshold(voice) {
                current.set(voice, step, true);
            } else if hit && x > 1.0 - intensity * 0.15 {
                current.set(voice, step, false);
            }
        }
    }
    current
}
