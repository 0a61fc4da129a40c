//! MIDI input via midir, feeding a NoteTracker

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use log::{debug, info};
use midir::{Ignore, MidiInput, MidiInputConnection};

use liveloom::io::MidiEvent;
use liveloom::synth::{MidiBus, NoteTracker};

/// Open input port `index` and publish what it plays onto `bus`. The
/// connection closes when the returned handle is dropped.
pub fn connect(index: usize, bus: MidiBus) -> EyreResult<MidiInputConnection<NoteTracker>> {
    let mut input = MidiInput::new("loom").wrap_err("failed to initialise MIDI input")?;
    input.ignore(Ignore::Sysex | Ignore::Time | Ignore::ActiveSense);

    let ports = input.ports();
    for (i, port) in ports.iter().enumerate() {
        debug!("MIDI port {}: {}", i, input.port_name(port).unwrap_or_default());
    }
    let port = ports
        .get(index)
        .ok_or_else(|| eyre!("MIDI port {} not found ({} available)", index, ports.len()))?
        .clone();
    let name = input.port_name(&port).unwrap_or_else(|_| format!("port {}", index));

    let connection = input
        .connect(
            &port,
            "loom-input",
            |_timestamp, bytes, tracker: &mut NoteTracker| {
                if let Some(event) = MidiEvent::from_bytes(bytes) {
                    tracker.handle(event);
                }
            },
            NoteTracker::new(bus),
        )
        .map_err(|e| eyre!("failed to connect to {}: {}", name, e))?;

    info!("listening to MIDI from {}", name);
    Ok(connection)
}
