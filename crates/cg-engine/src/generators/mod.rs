//! Built-in generators and the registry hosts look them up in.

pub mod bass;
pub mod chord;
pub mod drum;

use alloc::boxed::Box;

use crate::generator::{Generator, GeneratorInfo, GeneratorKind};

pub use bass::BassGenerator;
pub use chord::ChordGenerator;
pub use drum::{DrumGenerator, LearnState};

/// Every generator this crate provides.
pub static GENERATORS: [&GeneratorInfo; 3] = [&bass::INFO, &chord::INFO, &drum::INFO];

/// Look up generator metadata by URI or short name.
pub fn find_info(name: &str) -> Option<&'static GeneratorInfo> {
    GENERATORS.iter().copied().find(|info| info.matches(name))
}

/// Create a generator by URI or short name.
///
/// `seed` feeds the generators that use non-chaotic randomness; the
/// others ignore it. Returns `None` for unknown names.
pub fn create_generator(name: &str, seed: Option<u64>) -> Option<Box<dyn Generator>> {
    let info = find_info(name)?;
    Some(match info.kind {
        GeneratorKind::Bass => Box::new(BassGenerator::new()),
        GeneratorKind::Chord => Box::new(ChordGenerator::new()),
        GeneratorKind::Drum => {
            Box::new(DrumGenerator::with_seed(seed.unwrap_or(drum::DEFAULT_SEED)))
        }
    })
}
