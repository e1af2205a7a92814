//! Headless controller for chaosgen.
//!
//! Provides a unified API for configuring a rack of generators, rendering
//! MIDI files through it and running it against live ports, shared by the
//! CLI and the integration tests.

mod config;
mod live;
mod rack;
mod render;

use std::fmt;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use cg_midi::{MidirInput, MidirOutput};
use tracing::{info, warn};

// Re-export common types so callers don't need the lower crates directly.
pub use cg_engine::{GeneratorInfo, GENERATORS};
pub use cg_formats::FormatError;
pub use cg_ir::Performance;
pub use cg_midi::{list_ports, MidiError, NoteOutput, PortList};

pub use config::{GeneratorConfig, RackConfig};
pub use live::{LiveSession, MAX_BLOCK_INPUT, MAX_BLOCK_OUTPUT};
pub use rack::{InstanceKey, Rack};
pub use render::render;

/// Capacity of the live input ring buffer, in messages.
pub const INPUT_QUEUE_CAPACITY: usize = 1024;

/// Error type for host operations.
#[derive(Debug)]
pub enum HostError {
    Io(std::io::Error),
    /// Invalid or unreadable configuration
    Config(String),
    /// No generator has this URI or short name
    UnknownGenerator(String),
    /// The generator has no control with this symbol
    UnknownControl { generator: String, control: String },
    Format(FormatError),
    Midi(MidiError),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Io(e) => write!(f, "I/O error: {}", e),
            HostError::Config(msg) => write!(f, "Config error: {}", msg),
            HostError::UnknownGenerator(name) => write!(f, "Unknown generator '{}'", name),
            HostError::UnknownControl { generator, control } => {
                write!(f, "Generator '{}' has no control '{}'", generator, control)
            }
            HostError::Format(e) => write!(f, "{}", e),
            HostError::Midi(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HostError::Io(e) => Some(e),
            HostError::Format(e) => Some(e),
            HostError::Midi(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for HostError {
    fn from(e: std::io::Error) -> Self {
        HostError::Io(e)
    }
}

impl From<FormatError> for HostError {
    fn from(e: FormatError) -> Self {
        HostError::Format(e)
    }
}

impl From<MidiError> for HostError {
    fn from(e: MidiError) -> Self {
        HostError::Midi(e)
    }
}

/// Headless controller: owns a configuration and builds racks from it.
pub struct Controller {
    config: RackConfig,
}

impl Controller {
    pub fn new(config: RackConfig) -> Result<Self, HostError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, HostError> {
        Self::new(RackConfig::load(path)?)
    }

    pub fn config(&self) -> &RackConfig {
        &self.config
    }

    /// A fresh rack with every configured generator in its initial state.
    pub fn build_rack(&self) -> Result<Rack, HostError> {
        Rack::from_config(&self.config)
    }

    // --- Offline rendering ---

    pub fn render_performance(&self, input: &mut Performance) -> Result<Performance, HostError> {
        let mut rack = self.build_rack()?;
        Ok(render(&mut rack, input, self.config.block_size, self.config.tail_frames))
    }

    /// Render SMF bytes through a fresh rack and return the output SMF.
    pub fn render_smf(&self, data: &[u8]) -> Result<Vec<u8>, HostError> {
        let mut input = cg_formats::load_smf(data, self.config.sample_rate)?;
        let output = self.render_performance(&mut input)?;
        info!(
            notes_in = input.note_on_count(),
            notes_out = output.note_on_count(),
            "rendered"
        );
        Ok(cg_formats::write_smf(&output)?)
    }

    pub fn render_file(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<(), HostError> {
        let data = std::fs::read(input)?;
        let rendered = self.render_smf(&data)?;
        std::fs::write(output, rendered)?;
        Ok(())
    }

    // --- Live ---

    /// Connect to ports by name and run until `stop` is set.
    pub fn run_live(&self, input: &str, output: &str, stop: &AtomicBool) -> Result<(), HostError> {
        let (midi_in, consumer) = MidirInput::connect(input, INPUT_QUEUE_CAPACITY)?;
        let mut midi_out = MidirOutput::connect(output)?;
        let mut session = LiveSession::new(
            self.build_rack()?,
            consumer,
            self.config.sample_rate,
            self.config.block_size,
        );
        session.run(&|| midi_in.now_us(), stop, &mut midi_out)?;
        if midi_in.dropped() > 0 {
            warn!(dropped = midi_in.dropped(), "input messages lost to a full queue");
        }
        Ok(())
    }
}
