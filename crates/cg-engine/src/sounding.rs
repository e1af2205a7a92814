//! Sounding-note bookkeeping.
//!
//! A pitch is in the set iff the generator emitted a note-on for it and has
//! not yet emitted the matching note-off. All note emission for tracked
//! generators goes through here, so the set is only ever changed by events
//! the sink actually accepted.

use cg_ir::{TimedEvent, DATA_MAX};

use crate::sink::EventSink;

const PITCHES: usize = DATA_MAX as usize + 1;

/// Pitch-indexed set of notes this generator is responsible for releasing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoundingSet {
    bits: u128,
    /// Channel each sounding pitch was started on
    channels: [u8; PITCHES],
    /// Events the sink refused since the last `take_dropped`
    dropped: u32,
}

impl SoundingSet {
    pub const fn new() -> Self {
        Self {
            bits: 0,
            channels: [0; PITCHES],
            dropped: 0,
        }
    }

    pub fn contains(&self, pitch: u8) -> bool {
        pitch <= DATA_MAX && self.bits & (1u128 << pitch) != 0
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Sounding pitches, lowest first.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=DATA_MAX).filter(move |&p| self.contains(p))
    }

    /// Channel the pitch was started on, if sounding.
    pub fn channel_of(&self, pitch: u8) -> Option<u8> {
        self.contains(pitch).then(|| self.channels[pitch as usize])
    }

    /// Refused-event count since the last call, resetting it.
    pub fn take_dropped(&mut self) -> u32 {
        core::mem::take(&mut self.dropped)
    }

    fn insert(&mut self, pitch: u8, channel: u8) {
        self.bits |= 1u128 << pitch;
        self.channels[pitch as usize] = channel;
    }

    fn remove(&mut self, pitch: u8) {
        self.bits &= !(1u128 << pitch);
    }

    /// Emit a note-on and mark the pitch sounding.
    ///
    /// A pitch that is already sounding is released first so every note-on
    /// keeps a matching note-off. Emits nothing and returns `false` when the
    /// sink cannot take the whole exchange.
    pub fn start(
        &mut self,
        sink: &mut dyn EventSink,
        frame: u32,
        channel: u8,
        pitch: u8,
        velocity: u8,
    ) -> bool {
        if pitch > DATA_MAX {
            return false;
        }
        let retrigger = self.contains(pitch);
        let needed = if retrigger { 2 } else { 1 };
        if sink.remaining() < needed {
            self.dropped = self.dropped.saturating_add(needed as u32);
            return false;
        }
        if retrigger {
            let off_channel = self.channels[pitch as usize];
            if sink.push(TimedEvent::note_off(frame, off_channel, pitch)).is_err() {
                return false;
            }
            self.remove(pitch);
        }
        if sink.push(TimedEvent::note_on(frame, channel, pitch, velocity)).is_err() {
            return false;
        }
        self.insert(pitch, channel);
        true
    }

    /// Emit a note-off for every sounding pitch and clear them.
    ///
    /// Each note-off goes to the channel its note-on used. Pitches the sink
    /// has no room for stay sounding and are released on a later call.
    pub fn release_all(&mut self, sink: &mut dyn EventSink, frame: u32) -> usize {
        let mut released = 0;
        for pitch in 0..=DATA_MAX {
            if !self.contains(pitch) {
                continue;
            }
            let channel = self.channels[pitch as usize];
            if sink.push(TimedEvent::note_off(frame, channel, pitch)).is_err() {
                self.dropped = self.dropped.saturating_add(self.len() as u32);
                break;
            }
            self.remove(pitch);
            released += 1;
        }
        released
    }
}

impl Default for SoundingSet {
    fn default() -> Self {
        Self::new()
    }
}
