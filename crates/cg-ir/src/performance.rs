//! Absolute-time event lists for offline rendering.

use alloc::vec::Vec;
use core::ops::Range;

use crate::message::MidiMessage;

/// A message at an absolute sample position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PerformanceEvent {
    /// Sample frame from the start of the performance
    pub frame: u64,
    pub message: MidiMessage,
}

/// A time-sorted list of note messages.
///
/// Events at the same frame keep their insertion order. A cursor walks the
/// list block by block without removing anything.
#[derive(Clone, Debug, Default)]
pub struct Performance {
    /// Sample rate the frames are expressed in
    pub sample_rate: u32,
    events: Vec<PerformanceEvent>,
    /// Next event index to hand out
    cursor: usize,
}

impl Performance {
    /// Create an empty performance.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            events: Vec::new(),
            cursor: 0,
        }
    }

    /// Insert an event, keeping frames sorted and same-frame events in order.
    pub fn push(&mut self, frame: u64, message: MidiMessage) {
        let pos = self.events.partition_point(|e| e.frame <= frame);
        self.events.insert(pos, PerformanceEvent { frame, message });
    }

    /// Return the index range of events before `end` and advance past them.
    pub fn drain_before(&mut self, end: u64) -> Range<usize> {
        let start = self.cursor;
        while self.cursor < self.events.len() && self.events[self.cursor].frame < end {
            self.cursor += 1;
        }
        start..self.cursor
    }

    /// Get an event by index (for use with `drain_before` ranges).
    pub fn get(&self, index: usize) -> Option<&PerformanceEvent> {
        self.events.get(index)
    }

    /// Rewind the cursor to the first event.
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    pub fn events(&self) -> &[PerformanceEvent] {
        &self.events
    }

    /// Frame just past the last event, or 0 when empty.
    pub fn end_frame(&self) -> u64 {
        self.events.last().map(|e| e.frame + 1).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Count of note-on messages.
    pub fn note_on_count(&self) -> usize {
        self.events.iter().filter(|e| e.message.is_note_on()).count()
    }

    /// Count of note-off messages.
    pub fn note_off_count(&self) -> usize {
        self.events.iter().filter(|e| e.message.is_note_off()).count()
    }
}
