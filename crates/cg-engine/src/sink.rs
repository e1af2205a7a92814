//! Output event sinks.

use cg_ir::TimedEvent;

/// Default capacity of a [`BlockBuffer`] used by hosts.
pub const DEFAULT_BLOCK_CAPACITY: usize = 512;

/// Capacity-bounded, append-only destination for a block's output.
///
/// Generators check [`remaining`](EventSink::remaining) before emitting and
/// never push past it.
pub trait EventSink {
    /// Number of further events this sink accepts in the current block.
    fn remaining(&self) -> usize;

    /// Append an event, handing it back when the sink is full.
    fn push(&mut self, event: TimedEvent) -> Result<(), TimedEvent>;
}

/// Fixed-capacity output buffer for one block (no allocation).
#[derive(Clone, Debug, Default)]
pub struct BlockBuffer<const N: usize> {
    events: heapless::Vec<TimedEvent, N>,
}

impl<const N: usize> BlockBuffer<N> {
    pub const fn new() -> Self {
        Self { events: heapless::Vec::new() }
    }

    /// Drop all events (start of a new block).
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    /// Events in raw form: frame plus three message bytes.
    pub fn raw(&self) -> impl Iterator<Item = (u32, [u8; 3])> + '_ {
        self.events.iter().filter_map(TimedEvent::to_raw)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> EventSink for BlockBuffer<N> {
    fn remaining(&self) -> usize {
        N - self.events.len()
    }

    fn push(&mut self, event: TimedEvent) -> Result<(), TimedEvent> {
        self.events.push(event)
    }
}
