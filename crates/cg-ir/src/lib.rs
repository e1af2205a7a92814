//! Core note-event types for chaosgen.
//!
//! This crate defines the event vocabulary shared by the generators, the
//! file loaders and the live MIDI bridge. Raw MIDI bytes are decoded once
//! at the boundary into [`MidiMessage`]; nothing downstream inspects status
//! bits.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod drum;
mod event;
mod message;
mod performance;
mod voicing;

pub use drum::{DrumVoice, DRUM_CHANNEL, DRUM_COUNT};
pub use event::TimedEvent;
pub use message::{MidiMessage, CHANNEL_MAX, DATA_MAX};
pub use performance::{Performance, PerformanceEvent};
pub use voicing::{Voicing, MAX_CHORD_TONES};
