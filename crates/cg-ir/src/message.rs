//! Note messages decoded from raw 3-byte MIDI.

/// Highest valid MIDI data byte (pitch, velocity).
pub const DATA_MAX: u8 = 127;

/// Highest MIDI channel index (0-based).
pub const CHANNEL_MAX: u8 = 15;

const STATUS_NOTE_OFF: u8 = 0x80;
const STATUS_NOTE_ON: u8 = 0x90;

/// A channel-voice message, as far as the generators care.
///
/// A note-on with velocity 0 is decoded as `NoteOff`. Every other message
/// type (control change, pitch bend, sysex, ...) is `Other` and ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MidiMessage {
    /// Start a note
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    /// Release a note
    NoteOff { channel: u8, pitch: u8 },
    /// Anything the generators do not react to
    Other,
}

impl MidiMessage {
    /// Create a note-on, masking fields into their valid ranges.
    pub fn note_on(channel: u8, pitch: u8, velocity: u8) -> Self {
        Self::NoteOn {
            channel: channel & CHANNEL_MAX,
            pitch: pitch & DATA_MAX,
            velocity: velocity & DATA_MAX,
        }
    }

    /// Create a note-off, masking fields into their valid ranges.
    pub fn note_off(channel: u8, pitch: u8) -> Self {
        Self::NoteOff {
            channel: channel & CHANNEL_MAX,
            pitch: pitch & DATA_MAX,
        }
    }

    /// Decode a raw MIDI message.
    ///
    /// Messages shorter than three bytes, or with a data byte that has the
    /// high bit set, decode as `Other`.
    pub fn decode(bytes: &[u8]) -> Self {
        let &[status, pitch, velocity, ..] = bytes else {
            return Self::Other;
        };
        if pitch > DATA_MAX || velocity > DATA_MAX {
            return Self::Other;
        }
        let channel = status & 0x0F;
        match status & 0xF0 {
            STATUS_NOTE_ON if velocity > 0 => Self::NoteOn { channel, pitch, velocity },
            STATUS_NOTE_ON | STATUS_NOTE_OFF => Self::NoteOff { channel, pitch },
            _ => Self::Other,
        }
    }

    /// Encode as a raw 3-byte message. `Other` has no encoding.
    pub fn encode(&self) -> Option<[u8; 3]> {
        match *self {
            Self::NoteOn { channel, pitch, velocity } => {
                Some([STATUS_NOTE_ON | (channel & CHANNEL_MAX), pitch, velocity])
            }
            Self::NoteOff { channel, pitch } => {
                Some([STATUS_NOTE_OFF | (channel & CHANNEL_MAX), pitch, 0])
            }
            Self::Other => None,
        }
    }

    /// The message's channel, if it is a note message.
    pub fn channel(&self) -> Option<u8> {
        match *self {
            Self::NoteOn { channel, .. } | Self::NoteOff { channel, .. } => Some(channel),
            Self::Other => None,
        }
    }

    /// The message's pitch, if it is a note message.
    pub fn pitch(&self) -> Option<u8> {
        match *self {
            Self::NoteOn { pitch, .. } | Self::NoteOff { pitch, .. } => Some(pitch),
            Self::Other => None,
        }
    }

    pub fn is_note_on(&self) -> bool {
        matches!(self, Self::NoteOn { .. })
    }

    pub fn is_note_off(&self) -> bool {
        matches!(self, Self::NoteOff { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_note_on() {
        assert_eq!(
            MidiMessage::decode(&[0x93, 60, 100]),
            MidiMessage::NoteOn { channel: 3, pitch: 60, velocity: 100 }
        );
    }

    #[test]
    fn decode_zero_velocity_note_on_as_off() {
        assert_eq!(
            MidiMessage::decode(&[0x90, 64, 0]),
            MidiMessage::NoteOff { channel: 0, pitch: 64 }
        );
    }

    #[test]
    fn decode_note_off_ignores_release_velocity() {
        assert_eq!(
            MidiMessage::decode(&[0x8F, 36, 64]),
            MidiMessage::NoteOff { channel: 15, pitch: 36 }
        );
    }

    #[test]
    fn decode_other_messages() {
        // Control change, pitch bend, short message, bad data byte
        assert_eq!(MidiMessage::decode(&[0xB0, 7, 100]), MidiMessage::Other);
        assert_eq!(MidiMessage::decode(&[0xE0, 0, 64]), MidiMessage::Other);
        assert_eq!(MidiMessage::decode(&[0x90, 60]), MidiMessage::Other);
        assert_eq!(MidiMessage::decode(&[0x90, 0x80, 10]), MidiMessage::Other);
    }

    #[test]
    fn encode_note_off_has_zero_velocity() {
        assert_eq!(MidiMessage::note_off(9, 38).encode(), Some([0x89, 38, 0]));
        assert_eq!(MidiMessage::Other.encode(), None);
    }

    #[test]
    fn constructors_mask_out_of_range_fields() {
        assert_eq!(
            MidiMessage::note_on(17, 200, 255),
            MidiMessage::NoteOn { channel: 1, pitch: 72, velocity: 127 }
        );
    }
}
