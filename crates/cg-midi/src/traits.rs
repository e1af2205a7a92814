//! MIDI output trait, wire message and error types.

use cg_ir::TimedEvent;

/// Error type for MIDI port operations.
#[derive(Debug)]
pub enum MidiError {
    /// Failed to initialise the MIDI client
    Init(String),
    /// No port matches the requested name
    NoPort(String),
    /// Failed to open a connection
    Connect(String),
    /// Sending a message failed
    Send(String),
}

impl std::fmt::Display for MidiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MidiError::Init(msg) => write!(f, "MIDI init error: {}", msg),
            MidiError::NoPort(name) => write!(f, "No MIDI port matching '{}'", name),
            MidiError::Connect(msg) => write!(f, "MIDI connect error: {}", msg),
            MidiError::Send(msg) => write!(f, "MIDI send error: {}", msg),
        }
    }
}

impl std::error::Error for MidiError {}

/// A received message as it crosses from the port callback to the engine.
///
/// Fixed size so the ring buffer never allocates. Only the first three
/// bytes of longer messages are kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawMessage {
    /// Microseconds since the input was opened
    pub timestamp_us: u64,
    len: u8,
    bytes: [u8; 3],
}

impl RawMessage {
    pub fn new(timestamp_us: u64, data: &[u8]) -> Self {
        let mut bytes = [0; 3];
        let len = data.len().min(3);
        bytes[..len].copy_from_slice(&data[..len]);
        Self { timestamp_us, len: len as u8, bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Decode at a block-relative frame.
    pub fn to_event(&self, frame: u32) -> TimedEvent {
        TimedEvent::from_raw(frame, self.bytes())
    }
}

/// Trait for note-message destinations.
pub trait NoteOutput {
    /// Send one raw message immediately.
    fn send(&mut self, bytes: &[u8]) -> Result<(), MidiError>;

    /// Send a note event, skipping messages with no wire form.
    fn send_event(&mut self, event: &TimedEvent) -> Result<(), MidiError> {
        match event.to_raw() {
            Some((_, bytes)) => self.send(&bytes),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cg_ir::MidiMessage;

    #[derive(Default)]
    struct Recorder(Vec<Vec<u8>>);

    impl NoteOutput for Recorder {
        fn send(&mut self, bytes: &[u8]) -> Result<(), MidiError> {
            self.0.push(bytes.to_vec());
            Ok(())
        }
    }

    #[test]
    fn raw_message_keeps_three_bytes() {
        let msg = RawMessage::new(5, &[0x90, 60, 100, 0xF7]);
        assert_eq!(msg.bytes(), &[0x90, 60, 100]);
        assert_eq!(RawMessage::new(0, &[0xF8]).bytes(), &[0xF8]);
    }

    #[test]
    fn raw_message_decodes_at_frame() {
        let event = RawMessage::new(5, &[0x92, 60, 100]).to_event(17);
        assert_eq!(event.frame, 17);
        assert_eq!(event.message, MidiMessage::note_on(2, 60, 100));
        assert_eq!(RawMessage::new(0, &[0xF8]).to_event(0).message, MidiMessage::Other);
    }

    #[test]
    fn send_event_skips_other() {
        let mut out = Recorder::default();
        out.send_event(&TimedEvent::note_off(0, 1, 40)).unwrap();
        out.send_event(&TimedEvent::from_raw(0, &[0xB0, 1, 2])).unwrap();
        assert_eq!(out.0, vec![vec![0x81, 40, 0]]);
    }
}
