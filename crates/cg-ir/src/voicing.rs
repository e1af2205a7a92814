//! Fixed-capacity chord voicings.

use arrayvec::ArrayVec;

/// Maximum number of tones in a generated chord.
pub const MAX_CHORD_TONES: usize = 4;

/// Absolute pitches realising a chord, lowest-index tone first.
///
/// Stack-allocated so voicing work on the realtime path never allocates.
pub type Voicing = ArrayVec<u8, MAX_CHORD_TONES>;
