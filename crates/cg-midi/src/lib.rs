//! Live MIDI ports for chaosgen.

mod midir_backend;
mod traits;

pub use midir_backend::{list_ports, MidirInput, MidirOutput, PortList};
pub use traits::{MidiError, NoteOutput, RawMessage};
