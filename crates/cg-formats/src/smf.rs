//! Standard MIDI File conversion.
//!
//! Ticks are mapped to sample frames through the file's tempo map (or its
//! SMPTE rate for timecode files). Only note messages survive the trip;
//! everything else in the file is dropped on load.

use cg_ir::{MidiMessage, Performance};
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};

use crate::FormatError;

/// Tempo assumed until the file sets one: 120 BPM.
pub const DEFAULT_TEMPO_US: u32 = 500_000;

/// Ticks per quarter note in written files.
pub const WRITE_PPQ: u16 = 480;

/// Largest delta a variable-length quantity can hold.
const MAX_DELTA: u32 = (1 << 28) - 1;

/// A note message at an absolute tick, before time conversion.
struct TickEvent {
    tick: u64,
    /// Source track, for stable ordering across tracks
    track: usize,
    kind: TickKind,
}

enum TickKind {
    Tempo(u32),
    Note(MidiMessage),
}

/// Maps absolute ticks to microseconds.
enum Clock {
    Metrical {
        ppq: u64,
        /// Tick and time where the current tempo took effect
        anchor_tick: u64,
        anchor_us: u64,
        tempo_us: u64,
    },
    Timecode {
        ticks_per_second: f64,
    },
}

impl Clock {
    fn new(timing: Timing) -> Result<Self, FormatError> {
        match timing {
            Timing::Metrical(ppq) if ppq.as_int() > 0 => Ok(Clock::Metrical {
                ppq: ppq.as_int() as u64,
                anchor_tick: 0,
                anchor_us: 0,
                tempo_us: DEFAULT_TEMPO_US as u64,
            }),
            Timing::Timecode(fps, subframes) if subframes > 0 => Ok(Clock::Timecode {
                ticks_per_second: fps.as_f32() as f64 * subframes as f64,
            }),
            _ => Err(FormatError::UnsupportedTiming),
        }
    }

    fn micros(&self, tick: u64) -> u64 {
        match *self {
            Clock::Metrical { ppq, anchor_tick, anchor_us, tempo_us } => {
                anchor_us + (tick - anchor_tick) * tempo_us / ppq
            }
            Clock::Timecode { ticks_per_second } => {
                (tick as f64 * 1_000_000.0 / ticks_per_second) as u64
            }
        }
    }

    /// Apply a tempo change at `tick`. Timecode files ignore tempo.
    fn set_tempo(&mut self, tick: u64, tempo: u32) {
        let now = self.micros(tick);
        if let Clock::Metrical { anchor_tick, anchor_us, tempo_us, .. } = self {
            *anchor_tick = tick;
            *anchor_us = now;
            *tempo_us = tempo as u64;
        }
    }
}

fn convert_message(channel: u4, message: midly::MidiMessage) -> Option<MidiMessage> {
    let channel = channel.as_int();
    match message {
        midly::MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => {
            Some(MidiMessage::note_off(channel, key.as_int()))
        }
        midly::MidiMessage::NoteOn { key, vel } => {
            Some(MidiMessage::note_on(channel, key.as_int(), vel.as_int()))
        }
        midly::MidiMessage::NoteOff { key, .. } => Some(MidiMessage::note_off(channel, key.as_int())),
        _ => None,
    }
}

/// Load a Standard MIDI File into a performance at `sample_rate`.
///
/// Format 0 and 1 files are supported; the tracks of a format 1 file are
/// merged, with events at the same tick kept in track order.
pub fn load_smf(data: &[u8], sample_rate: u32) -> Result<Performance, FormatError> {
    let smf = Smf::parse(data).map_err(|e| FormatError::Parse(e.to_string()))?;
    if smf.header.format == Format::Sequential {
        return Err(FormatError::Parse("format 2 files are not supported".into()));
    }
    let mut clock = Clock::new(smf.header.timing)?;

    let mut events = Vec::new();
    for (track, track_events) in smf.tracks.iter().enumerate() {
        let mut tick = 0u64;
        for event in track_events {
            tick += event.delta.as_int() as u64;
            let kind = match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => TickKind::Tempo(tempo.as_int()),
                TrackEventKind::Midi { channel, message } => match convert_message(channel, message) {
                    Some(message) => TickKind::Note(message),
                    None => continue,
                },
                _ => continue,
            };
            events.push(TickEvent { tick, track, kind });
        }
    }
    events.sort_by_key(|e| (e.tick, e.track));

    let mut performance = Performance::new(sample_rate);
    for event in events {
        match event.kind {
            TickKind::Tempo(tempo) => clock.set_tempo(event.tick, tempo),
            TickKind::Note(message) => {
                let frame = clock.micros(event.tick) * sample_rate as u64 / 1_000_000;
                performance.push(frame, message);
            }
        }
    }
    Ok(performance)
}

fn to_midly(message: MidiMessage) -> Option<(u4, midly::MidiMessage)> {
    match message {
        MidiMessage::NoteOn { channel, pitch, velocity } => Some((
            u4::new(channel),
            midly::MidiMessage::NoteOn { key: u7::new(pitch), vel: u7::new(velocity) },
        )),
        MidiMessage::NoteOff { channel, pitch } => Some((
            u4::new(channel),
            midly::MidiMessage::NoteOff { key: u7::new(pitch), vel: u7::new(0) },
        )),
        MidiMessage::Other => None,
    }
}

/// Write a performance as a single-track SMF at 120 BPM.
pub fn write_smf(performance: &Performance) -> Result<Vec<u8>, FormatError> {
    let sample_rate = performance.sample_rate.max(1) as u64;
    // 120 BPM is two quarter notes per second
    let ticks_per_second = WRITE_PPQ as u64 * 2;

    let mut track: Track<'static> = Vec::new();
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(DEFAULT_TEMPO_US))),
    });

    let mut last_tick = 0u64;
    for event in performance.events() {
        let Some((channel, message)) = to_midly(event.message) else {
            continue;
        };
        let tick = (event.frame * ticks_per_second + sample_rate / 2) / sample_rate;
        let delta = u32::try_from(tick - last_tick)
            .ok()
            .filter(|&d| d <= MAX_DELTA)
            .ok_or_else(|| FormatError::Write(format!("event at frame {} is too far out", event.frame)))?;
        track.push(TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = tick;
    }
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let mut smf = Smf::new(Header::new(Format::SingleTrack, Timing::Metrical(u15::new(WRITE_PPQ))));
    smf.tracks.push(track);

    let mut buf = Vec::new();
    smf.write_std(&mut buf)
        .map_err(|e| FormatError::Write(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrical_clock_follows_tempo_changes() {
        let mut clock = Clock::new(Timing::Metrical(u15::new(480))).unwrap();
        assert_eq!(clock.micros(480), 500_000);
        clock.set_tempo(480, 250_000);
        assert_eq!(clock.micros(960), 750_000);
    }

    #[test]
    fn timecode_clock_ignores_tempo() {
        let mut clock = Clock::new(Timing::Timecode(midly::Fps::Fps25, 40)).unwrap();
        assert_eq!(clock.micros(1000), 1_000_000);
        clock.set_tempo(0, 250_000);
        assert_eq!(clock.micros(500), 500_000);
    }

    #[test]
    fn zero_ppq_is_unsupported() {
        assert!(matches!(
            Clock::new(Timing::Metrical(u15::new(0))),
            Err(FormatError::UnsupportedTiming)
        ));
    }

    #[test]
    fn zero_velocity_note_on_is_note_off() {
        let message = midly::MidiMessage::NoteOn { key: u7::new(60), vel: u7::new(0) };
        assert_eq!(convert_message(u4::new(3), message), Some(MidiMessage::note_off(3, 60)));
    }

    #[test]
    fn controllers_are_dropped() {
        let message = midly::MidiMessage::Controller { controller: u7::new(1), value: u7::new(64) };
        assert_eq!(convert_message(u4::new(0), message), None);
    }
}
