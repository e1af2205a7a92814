//! midir-based MIDI input and output.

use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use ringbuf::traits::{Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::traits::{MidiError, NoteOutput, RawMessage};

const CLIENT_NAME: &str = "chaosgen";

/// Names of the ports currently visible to the MIDI backend.
#[derive(Debug, Default, Clone)]
pub struct PortList {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

/// List every input and output port.
pub fn list_ports() -> Result<PortList, MidiError> {
    let midi_in = MidiInput::new(CLIENT_NAME).map_err(|e| MidiError::Init(e.to_string()))?;
    let midi_out = MidiOutput::new(CLIENT_NAME).map_err(|e| MidiError::Init(e.to_string()))?;
    Ok(PortList {
        inputs: midi_in.ports().iter().filter_map(|p| midi_in.port_name(p).ok()).collect(),
        outputs: midi_out.ports().iter().filter_map(|p| midi_out.port_name(p).ok()).collect(),
    })
}

/// First entry of `names` containing `wanted`.
fn match_port(names: &[String], wanted: &str) -> Option<usize> {
    names.iter().position(|n| n.contains(wanted))
}

/// An open input port feeding a ring buffer.
///
/// The port callback stamps each message with the microseconds elapsed
/// since the port was opened and pushes it without blocking; messages that
/// find the buffer full are counted and dropped.
pub struct MidirInput {
    _connection: MidiInputConnection<HeapProd<RawMessage>>,
    start: Instant,
    dropped: Arc<AtomicUsize>,
}

impl MidirInput {
    /// Open the first input whose name contains `name`.
    pub fn connect(name: &str, capacity: usize) -> Result<(Self, HeapCons<RawMessage>), MidiError> {
        let mut midi_in = MidiInput::new(CLIENT_NAME).map_err(|e| MidiError::Init(e.to_string()))?;
        midi_in.ignore(Ignore::Sysex | Ignore::Time | Ignore::ActiveSense);

        let ports = midi_in.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|p| midi_in.port_name(p).unwrap_or_default())
            .collect();
        let index = match_port(&names, name).ok_or_else(|| MidiError::NoPort(name.to_string()))?;

        let (producer, consumer) = HeapRb::<RawMessage>::new(capacity).split();
        let start = Instant::now();
        let dropped = Arc::new(AtomicUsize::new(0));
        let dropped_in_callback = dropped.clone();

        let connection = midi_in
            .connect(
                &ports[index],
                "chaosgen-input",
                move |_, message, producer| {
                    let now = start.elapsed().as_micros() as u64;
                    if producer.try_push(RawMessage::new(now, message)).is_err() {
                        dropped_in_callback.fetch_add(1, Ordering::Relaxed);
                    }
                },
                producer,
            )
            .map_err(|e| MidiError::Connect(e.to_string()))?;

        info!(port = %names[index], "MIDI input connected");
        Ok((
            Self {
                _connection: connection,
                start,
                dropped,
            },
            consumer,
        ))
    }

    /// Current time on the clock incoming messages are stamped with.
    pub fn now_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Messages lost to a full buffer so far.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// An open output port.
pub struct MidirOutput {
    connection: MidiOutputConnection,
}

impl MidirOutput {
    /// Open the first output whose name contains `name`.
    pub fn connect(name: &str) -> Result<Self, MidiError> {
        let midi_out = MidiOutput::new(CLIENT_NAME).map_err(|e| MidiError::Init(e.to_string()))?;
        let ports = midi_out.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|p| midi_out.port_name(p).unwrap_or_default())
            .collect();
        let index = match_port(&names, name).ok_or_else(|| MidiError::NoPort(name.to_string()))?;

        let connection = midi_out
            .connect(&ports[index], "chaosgen-output")
            .map_err(|e| MidiError::Connect(e.to_string()))?;
        info!(port = %names[index], "MIDI output connected");
        Ok(Self { connection })
    }
}

impl NoteOutput for MidirOutput {
    fn send(&mut self, bytes: &[u8]) -> Result<(), MidiError> {
        self.connection
            .send(bytes)
            .map_err(|e| MidiError::Send(e.to_string()))
    }
}
