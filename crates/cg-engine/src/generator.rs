//! Generator trait for note-stream generators.

use cg_ir::TimedEvent;

use crate::controls::{Controls, ParamInfo};
use crate::sink::EventSink;

/// Which family a generator belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeneratorKind {
    Bass,
    Chord,
    Drum,
}

/// Static metadata about a generator.
#[derive(Debug)]
pub struct GeneratorInfo {
    /// Unique identifier hosts address the generator by
    pub uri: &'static str,
    pub name: &'static str,
    pub short_name: &'static str,
    pub author: &'static str,
    pub kind: GeneratorKind,
    pub params: &'static [ParamInfo],
}

impl GeneratorInfo {
    /// Does `name` match this generator's URI or short name?
    pub fn matches(&self, name: &str) -> bool {
        self.uri == name || self.short_name.eq_ignore_ascii_case(name)
    }
}

/// Counts of notable things that happened while running.
///
/// Generators accumulate these inside `run` and hand them over through
/// [`Generator::take_report`], so hosts can log them outside the block loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Events the sink had no room for (dropped notes, deferred releases)
    pub dropped: u32,
    /// Strange key shifts drawn at bar boundaries
    pub key_shifts: u32,
    /// Drum patterns rebuilt at bar ends
    pub regenerations: u32,
    /// Learn mode switched on or off
    pub learn_changes: u32,
}

impl RunReport {
    /// Nothing happened worth logging.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Add another report's counts into this one.
    pub fn absorb(&mut self, other: RunReport) {
        self.dropped = self.dropped.saturating_add(other.dropped);
        self.key_shifts = self.key_shifts.saturating_add(other.key_shifts);
        self.regenerations = self.regenerations.saturating_add(other.regenerations);
        self.learn_changes = self.learn_changes.saturating_add(other.learn_changes);
    }
}

/// Core trait for block-driven generators.
///
/// `run` is called once per processing block with that block's incoming
/// events in timestamp order. It never blocks, never allocates, and appends
/// its output to `sink` in non-decreasing frame order.
pub trait Generator: Send {
    fn info(&self) -> &'static GeneratorInfo;

    /// Process one block.
    fn run(&mut self, events: &[TimedEvent], controls: &Controls, sink: &mut dyn EventSink);

    /// Release every note still sounding, stamped at `frame`.
    fn all_notes_off(&mut self, frame: u32, sink: &mut dyn EventSink);

    /// Number of notes this generator has started and not yet released.
    fn sounding_count(&self) -> usize;

    /// Counts gathered since the last call, resetting them.
    fn take_report(&mut self) -> RunReport;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_sums_and_saturates() {
        let mut total = RunReport { dropped: u32::MAX - 1, key_shifts: 1, ..RunReport::default() };
        total.absorb(RunReport { dropped: 5, regenerations: 2, ..RunReport::default() });
        assert_eq!(total.dropped, u32::MAX);
        assert_eq!(total.key_shifts, 1);
        assert_eq!(total.regenerations, 2);
        assert!(!total.is_empty());
        assert!(RunReport::default().is_empty());
    }
}
