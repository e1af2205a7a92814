//! Chaotic MIDI generators for chaosgen.
//!
//! Each generator turns a block of incoming note events into a block of
//! outgoing ones, driven by a logistic-map chaos source. Generators never
//! allocate or block while running.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod chaos;
mod controls;
mod generator;
pub mod generators;
mod pattern;
mod sink;
mod sounding;
mod voice_leading;

pub use chaos::{bucket, Chaos, DEFAULT_GROWTH_RATE, GROWTH_RATE_MAX, GROWTH_RATE_MIN, SEED};
pub use controls::{find_param, Controls, ParamInfo, MAX_PARAMS};
pub use generator::{Generator, GeneratorInfo, GeneratorKind, RunReport};
pub use generators::{create_generator, find_info, GENERATORS};
pub use pattern::{add_threshold, mutate, PatternGrid, BASE_PATTERN, STEPS};
pub use sink::{BlockBuffer, EventSink, DEFAULT_BLOCK_CAPACITY};
pub use sounding::SoundingSet;
pub use voice_leading::{transpose, voice_distance, Candidate, PriorVoicing, OCTAVE_SHIFTS};
