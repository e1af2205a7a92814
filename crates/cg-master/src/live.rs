//! Real-time block loop between a MIDI input buffer and an output port.

use cg_ir::TimedEvent;
use cg_midi::{NoteOutput, RawMessage};
use ringbuf::traits::Consumer;
use ringbuf::HeapCons;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

use crate::rack::Rack;
use crate::HostError;

/// Most input events taken into one block; the rest wait for the next.
pub const MAX_BLOCK_INPUT: usize = 256;

/// Smallest output buffer a session reserves. Larger racks get one sized
/// to hold every instance's full block.
pub const MAX_BLOCK_OUTPUT: usize = 2048;

/// A rack driven by timestamped messages from an input port.
pub struct LiveSession {
    rack: Rack,
    input: HeapCons<RawMessage>,
    sample_rate: u32,
    block_size: u32,
    block_in: Vec<TimedEvent>,
    block_out: Vec<TimedEvent>,
    /// Merged events with no room in `block_out` this block
    overflow: u32,
}

impl LiveSession {
    pub fn new(rack: Rack, input: HeapCons<RawMessage>, sample_rate: u32, block_size: u32) -> Self {
        let output_capacity = rack.max_block_output().max(MAX_BLOCK_OUTPUT);
        Self {
            rack,
            input,
            sample_rate: sample_rate.max(1),
            block_size: block_size.max(1),
            block_in: Vec::with_capacity(MAX_BLOCK_INPUT),
            block_out: Vec::with_capacity(output_capacity),
            overflow: 0,
        }
    }

    pub fn rack(&self) -> &Rack {
        &self.rack
    }

    /// Events one block can send without dropping any.
    pub fn output_capacity(&self) -> usize {
        self.block_out.capacity()
    }

    /// Length of one block in microseconds.
    pub fn block_period(&self) -> Duration {
        Duration::from_micros(self.block_size as u64 * 1_000_000 / self.sample_rate as u64)
    }

    /// Block-relative frame for a message stamped `timestamp_us`.
    fn frame_offset(&self, block_start_us: u64, timestamp_us: u64) -> u32 {
        let frames = timestamp_us.saturating_sub(block_start_us) * self.sample_rate as u64 / 1_000_000;
        frames.min(self.block_size as u64 - 1) as u32
    }

    /// Pull the messages that arrived since `block_start_us`, run the rack
    /// and send what it produced. Returns the number of messages sent.
    pub fn process_block(&mut self, block_start_us: u64, out: &mut dyn NoteOutput) -> Result<usize, HostError> {
        self.block_in.clear();
        while self.block_in.len() < MAX_BLOCK_INPUT {
            let Some(message) = self.input.try_pop() else {
                break;
            };
            let frame = self.frame_offset(block_start_us, message.timestamp_us);
            self.block_in.push(message.to_event(frame));
        }

        self.block_out.clear();
        self.run_rack();
        self.log_block();
        self.send(out)
    }

    #[cfg(not(feature = "alloc_check"))]
    fn run_rack(&mut self) {
        let block_out = &mut self.block_out;
        let overflow = &mut self.overflow;
        self.rack
            .process_block(&self.block_in, &mut |event| push_bounded(block_out, overflow, event));
    }

    #[cfg(feature = "alloc_check")]
    fn run_rack(&mut self) {
        let block_out = &mut self.block_out;
        let overflow = &mut self.overflow;
        let rack = &mut self.rack;
        let block_in = &self.block_in;
        assert_no_alloc::assert_no_alloc(|| {
            rack.process_block(block_in, &mut |event| push_bounded(block_out, overflow, event))
        });
    }

    /// Log what the last block reported, outside the checked section.
    fn log_block(&mut self) {
        self.rack.log_reports();
        if self.overflow > 0 {
            warn!(dropped = self.overflow, "live output full, events dropped");
            self.overflow = 0;
        }
    }

    fn send(&mut self, out: &mut dyn NoteOutput) -> Result<usize, HostError> {
        for event in &self.block_out {
            out.send_event(event)?;
        }
        Ok(self.block_out.len())
    }

    /// Release everything still sounding.
    pub fn flush(&mut self, out: &mut dyn NoteOutput) -> Result<usize, HostError> {
        self.block_out.clear();
        let block_out = &mut self.block_out;
        let overflow = &mut self.overflow;
        self.rack.flush(0, &mut |event| push_bounded(block_out, overflow, event));
        self.log_block();
        self.send(out)
    }

    /// Process one block per block period until `stop` is set, then flush.
    ///
    /// `now_us` reads the clock the input messages are stamped with. A
    /// failed send ends the session, but held notes are still released
    /// before the error is returned.
    pub fn run(
        &mut self,
        now_us: &dyn Fn() -> u64,
        stop: &AtomicBool,
        out: &mut dyn NoteOutput,
    ) -> Result<(), HostError> {
        let period = self.block_period();
        info!(block_us = period.as_micros() as u64, "live session started");

        let mut block_start = now_us();
        while !stop.load(Ordering::Relaxed) {
            std::thread::sleep(period);
            if let Err(e) = self.process_block(block_start, out) {
                if let Err(flush_err) = self.flush(out) {
                    warn!(error = %flush_err, "release after send failure also failed");
                }
                return Err(e);
            }
            block_start += period.as_micros() as u64;
        }

        let released = self.flush(out)?;
        info!(released, "live session stopped");
        Ok(())
    }
}

/// Append without growing past the reserved capacity.
fn push_bounded(block_out: &mut Vec<TimedEvent>, overflow: &mut u32, event: TimedEvent) {
    if block_out.len() < block_out.capacity() {
        block_out.push(event);
    } else {
        *overflow = overflow.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cg_midi::MidiError;
    use ringbuf::traits::{Producer, Split};
    use ringbuf::HeapRb;

    #[derive(Default)]
    struct Recorder(Vec<[u8; 3]>);

    impl NoteOutput for Recorder {
        fn send(&mut self, bytes: &[u8]) -> Result<(), MidiError> {
            self.0.push([bytes[0], bytes[1], bytes[2]]);
            Ok(())
        }
    }

    struct Broken;

    /// Refuses the first message, then records like [`Recorder`].
    #[derive(Default)]
    struct FailsOnce {
        failed: bool,
        sent: Vec<[u8; 3]>,
    }

    impl NoteOutput for FailsOnce {
        fn send(&mut self, bytes: &[u8]) -> Result<(), MidiError> {
            if !self.failed {
                self.failed = true;
                return Err(MidiError::Send("port busy".into()));
            }
            self.sent.push([bytes[0], bytes[1], bytes[2]]);
            Ok(())
        }
    }

    impl NoteOutput for Broken {
        fn send(&mut self, _bytes: &[u8]) -> Result<(), MidiError> {
            Err(MidiError::Send("port closed".into()))
        }
    }

    fn session(name: &str) -> (LiveSession, ringbuf::HeapProd<RawMessage>) {
        let mut rack = Rack::new();
        rack.add(name, None).unwrap();
        let (producer, consumer) = HeapRb::<RawMessage>::new(64).split();
        (LiveSession::new(rack, consumer, 48000, 480), producer)
    }

    #[test]
    fn block_period_matches_block_size() {
        let (live, _) = session("bass");
        assert_eq!(live.block_period(), Duration::from_millis(10));
    }

    #[test]
    fn timestamps_map_to_clamped_frames() {
        let (live, _) = session("bass");
        assert_eq!(live.frame_offset(1_000, 1_000), 0);
        assert_eq!(live.frame_offset(1_000, 2_000), 48);
        assert_eq!(live.frame_offset(1_000, 500), 0);
        assert_eq!(live.frame_offset(1_000, 1_000_000), 479);
    }

    #[test]
    fn chord_is_sent_then_flushed() {
        let (mut live, mut producer) = session("chord");
        let mut out = Recorder::default();
        producer.try_push(RawMessage::new(100, &[0x90, 60, 100])).unwrap();

        assert_eq!(live.process_block(0, &mut out).unwrap(), 3);
        assert!(out.0.iter().all(|m| m[0] == 0x90));
        assert_eq!(live.rack().sounding_count(), 3);

        assert_eq!(live.flush(&mut out).unwrap(), 3);
        assert!(out.0[3..].iter().all(|m| m[0] == 0x80));
        assert_eq!(live.rack().sounding_count(), 0);
    }

    #[test]
    fn idle_block_sends_nothing() {
        let (mut live, _producer) = session("drum");
        let mut out = Recorder::default();
        assert_eq!(live.process_block(0, &mut out).unwrap(), 0);
        assert!(out.0.is_empty());
    }

    #[test]
    fn send_failure_is_reported() {
        let (mut live, mut producer) = session("drum");
        producer.try_push(RawMessage::new(0, &[0x99, 36, 100])).unwrap();
        assert!(matches!(
            live.process_block(0, &mut Broken),
            Err(HostError::Midi(MidiError::Send(_)))
        ));
    }

    #[test]
    fn send_failure_still_releases_held_notes() {
        let (mut live, mut producer) = session("chord");
        producer.try_push(RawMessage::new(0, &[0x90, 60, 100])).unwrap();
        let stop = AtomicBool::new(false);
        let mut out = FailsOnce::default();

        assert!(live.run(&|| 0, &stop, &mut out).is_err());
        assert_eq!(live.rack().sounding_count(), 0);
        // the first note-on was refused; the release covers all three tones
        assert_eq!(out.sent.len(), 3);
        assert!(out.sent.iter().all(|m| m[0] & 0xF0 == 0x80));
    }

    #[test]
    fn output_capacity_grows_with_the_rack() {
        let mut rack = Rack::new();
        for _ in 0..9 {
            rack.add("chord", None).unwrap();
        }
        let (_producer, consumer) = HeapRb::<RawMessage>::new(4).split();
        let live = LiveSession::new(rack, consumer, 48000, 480);
        assert!(live.output_capacity() >= live.rack().max_block_output());
        assert!(live.rack().max_block_output() > MAX_BLOCK_OUTPUT);
    }

    #[test]
    fn crowded_rack_sends_every_release() {
        let mut rack = Rack::new();
        for _ in 0..9 {
            rack.add("chord", None).unwrap();
        }
        let (mut producer, consumer) = HeapRb::<RawMessage>::new(MAX_BLOCK_INPUT).split();
        let mut live = LiveSession::new(rack, consumer, 48000, 480);
        for i in 0..MAX_BLOCK_INPUT as u64 {
            let status = if i % 2 == 0 { 0x90 } else { 0x80 };
            producer.try_push(RawMessage::new(i, &[status, 60, 100])).unwrap();
        }
        let mut out = Recorder::default();

        let sent = live.process_block(0, &mut out).unwrap();
        assert!(sent > MAX_BLOCK_OUTPUT);
        live.flush(&mut out).unwrap();

        let ons = out.0.iter().filter(|m| m[0] & 0xF0 == 0x90).count();
        let offs = out.0.iter().filter(|m| m[0] & 0xF0 == 0x80).count();
        assert_eq!(ons, offs);
        assert_eq!(live.rack().sounding_count(), 0);
    }

    #[test]
    fn run_flushes_when_stopped() {
        let (mut live, mut producer) = session("bass");
        producer.try_push(RawMessage::new(0, &[0x90, 40, 100])).unwrap();
        let stop = AtomicBool::new(false);
        let mut out = Recorder::default();

        live.process_block(0, &mut out).unwrap();
        stop.store(true, Ordering::Relaxed);
        live.run(&|| 0, &stop, &mut out).unwrap();

        let ons = out.0.iter().filter(|m| m[0] & 0xF0 == 0x90).count();
        let offs = out.0.iter().filter(|m| m[0] & 0xF0 == 0x80).count();
        assert_eq!(ons, 1);
        assert_eq!(offs, 1);
    }
}
