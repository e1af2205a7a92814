//! General MIDI drum kit subset used by the drum generator.

/// Number of drum voices in the kit.
pub const DRUM_COUNT: usize = 7;

/// GM percussion channel (channel 10, 0-based 9).
pub const DRUM_CHANNEL: u8 = 9;

/// One instrument of the seven-piece kit, in grid row order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrumVoice {
    Kick,
    Snare,
    HiHat,
    Cowbell,
    TomLow,
    TomMid,
    TomHigh,
}

impl DrumVoice {
    /// All voices in grid row order.
    pub const ALL: [DrumVoice; DRUM_COUNT] = [
        DrumVoice::Kick,
        DrumVoice::Snare,
        DrumVoice::HiHat,
        DrumVoice::Cowbell,
        DrumVoice::TomLow,
        DrumVoice::TomMid,
        DrumVoice::TomHigh,
    ];

    /// Grid row index (0-6).
    pub const fn index(self) -> usize {
        self as usize
    }

    /// GM note number for this voice.
    pub const fn note(self) -> u8 {
        match self {
            DrumVoice::Kick => 36,
            DrumVoice::Snare => 38,
            DrumVoice::HiHat => 42,
            DrumVoice::Cowbell => 56,
            DrumVoice::TomLow => 41,
            DrumVoice::TomMid => 43,
            DrumVoice::TomHigh => 45,
        }
    }

    /// Map an incoming pitch to a kit voice, if it is one of ours.
    pub fn from_note(pitch: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.note() == pitch)
    }

    pub const fn name(self) -> &'static str {
        match self {
            DrumVoice::Kick => "kick",
            DrumVoice::Snare => "snare",
            DrumVoice::HiHat => "hihat",
            DrumVoice::Cowbell => "cowbell",
            DrumVoice::TomLow => "tom_low",
            DrumVoice::TomMid => "tom_mid",
            DrumVoice::TomHigh => "tom_high",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kit_notes_and_rows_map_back_to_voices() {
        for voice in DrumVoice::ALL {
            assert_eq!(DrumVoice::from_note(voice.note()), Some(voice));
            assert_eq!(DrumVoice::ALL[voice.index()], voice);
        }
    }

    #[test]
    fn unknown_pitch_is_not_a_drum() {
        assert_eq!(DrumVoice::from_note(60), None);
        assert_eq!(DrumVoice::from_note(37), None);
    }
}
