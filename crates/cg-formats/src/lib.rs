//! File formats for chaosgen.
//!
//! Loads Standard MIDI Files into sample-timed [`Performance`]s and writes
//! them back out.
//!
//! [`Performance`]: cg_ir::Performance

mod smf;

pub use smf::{load_smf, write_smf, DEFAULT_TEMPO_US, WRITE_PPQ};

use core::fmt;

/// Error type for format parsing and writing.
#[derive(Debug)]
pub enum FormatError {
    /// The file is not a readable SMF
    Parse(String),
    /// Serialising the SMF failed
    Write(String),
    /// The header's timing cannot be mapped to wall-clock time
    UnsupportedTiming,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FormatError::Parse(msg) => write!(f, "invalid MIDI file: {}", msg),
            FormatError::Write(msg) => write!(f, "failed to write MIDI file: {}", msg),
            FormatError::UnsupportedTiming => write!(f, "unsupported MIDI file timing"),
        }
    }
}

impl std::error::Error for FormatError {}
