//! Block-relative timed events exchanged with a generator.

use crate::message::MidiMessage;

/// A note message stamped with its sample offset inside the current block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimedEvent {
    /// Sample offset from the start of the block
    pub frame: u32,
    /// What happened
    pub message: MidiMessage,
}

impl TimedEvent {
    /// Create a new event.
    pub fn new(frame: u32, message: MidiMessage) -> Self {
        Self { frame, message }
    }

    /// Decode a raw MIDI message at `frame`.
    pub fn from_raw(frame: u32, bytes: &[u8]) -> Self {
        Self::new(frame, MidiMessage::decode(bytes))
    }

    /// Create a note-on event.
    pub fn note_on(frame: u32, channel: u8, pitch: u8, velocity: u8) -> Self {
        Self::new(frame, MidiMessage::note_on(channel, pitch, velocity))
    }

    /// Create a note-off event.
    pub fn note_off(frame: u32, channel: u8, pitch: u8) -> Self {
        Self::new(frame, MidiMessage::note_off(channel, pitch))
    }

    /// Encode for an output buffer: frame plus three message bytes.
    pub fn to_raw(&self) -> Option<(u32, [u8; 3])> {
        self.message.encode().map(|bytes| (self.frame, bytes))
    }
}
