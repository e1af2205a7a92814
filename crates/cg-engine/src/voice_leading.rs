//! Voice-leading optimiser for consecutive chords.
//!
//! A freshly built chord is tried an octave down, in place and an octave
//! up; the placement whose tones sit closest to the previous chord wins.

use cg_ir::{Voicing, DATA_MAX, MAX_CHORD_TONES};

/// Whole-chord octave shifts, in search order.
pub const OCTAVE_SHIFTS: [i32; 3] = [-12, 0, 12];

/// Search order for the very first chord: untransposed first.
const FIRST_CHORD_SHIFTS: [i32; 3] = [0, -12, 12];

/// Candidate chord tones before range checking.
pub type Candidate = arrayvec::ArrayVec<i32, MAX_CHORD_TONES>;

/// Shift every tone, dropping any that leave the MIDI range.
pub fn transpose(candidate: &[i32], shift: i32) -> Voicing {
    candidate
        .iter()
        .map(|&p| p + shift)
        .filter(|p| (0..=DATA_MAX as i32).contains(p))
        .map(|p| p as u8)
        .collect()
}

/// Total closest-tone distance from `prior` to `candidate`.
///
/// For each of the first `min(prior.len(), candidate.len())` prior tones,
/// adds the smallest absolute distance to any candidate tone. Matching is
/// by proximity, not by position.
pub fn voice_distance(prior: &[u8], candidate: &[u8]) -> u32 {
    let n = prior.len().min(candidate.len());
    prior[..n]
        .iter()
        .map(|&p| {
            candidate
                .iter()
                .map(|&c| (p as i32 - c as i32).unsigned_abs())
                .min()
                .unwrap_or(DATA_MAX as u32)
        })
        .sum()
}

/// The last chord that was voiced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriorVoicing {
    tones: Voicing,
    first: bool,
}

impl PriorVoicing {
    pub fn new() -> Self {
        Self {
            tones: Voicing::new(),
            first: true,
        }
    }

    pub fn tones(&self) -> &[u8] {
        &self.tones
    }

    /// True until the first chord has been voiced.
    pub fn is_first(&self) -> bool {
        self.first
    }

    /// Choose the octave placement of `candidate` nearest the prior chord.
    ///
    /// Shifts with no in-range tone are skipped; ties keep the earlier
    /// shift. The first chord ever has distance zero and stays where it
    /// was built. The choice becomes the new prior. Returns `None` (and
    /// leaves the prior alone) when no shift yields a playable tone.
    pub fn optimize(&mut self, candidate: &[i32]) -> Option<Voicing> {
        let shifts = if self.first { &FIRST_CHORD_SHIFTS } else { &OCTAVE_SHIFTS };

        let mut best: Option<(u32, Voicing)> = None;
        for &shift in shifts {
            let voicing = transpose(candidate, shift);
            if voicing.is_empty() {
                continue;
            }
            let distance = if self.first {
                0
            } else {
                voice_distance(&self.tones, &voicing)
            };
            if best.as_ref().map_or(true, |(d, _)| distance < *d) {
                best = Some((distance, voicing));
            }
        }

        let (_, chosen) = best?;
        self.tones = chosen.clone();
        self.first = false;
        Some(chosen)
    }
}

impl Default for PriorVoicing {
    fn default() -> Self {
        Self::new()
    }
}
