use std::collections::BTreeMap;

use log::debug;

use crate::io::midi::MidiEvent;
use crate::synth::snapshot::MidiBus;

/// Turns a stream of MIDI events into published snapshots.
///
/// Lives on the ingestion thread. Every note event republishes the complete
/// set of held notes; controller events publish the single controller. Note
/// on with velocity 0 is a note off, as running-status keyboards send it.
#[derive(Debug)]
pub struct NoteTracker {
    bus: MidiBus,
    held: BTreeMap<u8, u8>,
    channel: Option<u8>,
}

impl NoteTracker {
    pub fn new(bus: MidiBus) -> Self {
        Self {
            bus,
            held: BTreeMap::new(),
            channel: None,
        }
    }

    /// Only accept events from one MIDI channel (0-based).
    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn held(&self) -> &BTreeMap<u8, u8> {
        &self.held
    }

    pub fn handle(&mut self, event: MidiEvent) {
        if let Some(wanted) = self.channel {
            if event.channel() != wanted {
                return;
            }
        }

        match event {
            MidiEvent::NoteOn { key, velocity, .. } if velocity > 0 => {
                self.held.insert(key, velocity);
                self.publish_notes();
            }
            MidiEvent::NoteOn { key, .. } | MidiEvent::NoteOff { key, .. } => {
                self.held.remove(&key);
                self.publish_notes();
            }
            MidiEvent::ControlChange {
                controller, value, ..
            } => {
                debug!("CC{} = {}", controller, value);
                self.bus.set_control(controller, value);
            }
            MidiEvent::PitchBend { .. } | MidiEvent::ProgramChange { .. } => {}
        }
    }

    fn publish_notes(&self) {
        debug!("held notes: {:?}", self.held);
        self.bus.replace_active_notes(self.held.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_on(key: u8, velocity: u8) -> MidiEvent {
        MidiEvent::NoteOn {
            channel: 0,
            key,
            velocity,
        }
    }

    #[test]
    fn test_note_on_and_off() {
        let bus = MidiBus::new();
        let mut tracker = NoteTracker::new(bus.clone());
        tracker.handle(note_on(60, 100));
        tracker.handle(note_on(64, 90));
        tracker.handle(MidiEvent::NoteOff {
            channel: 0,
            key: 60,
            velocity: 0,
        });
        let snapshot = bus.snapshot();
        assert_eq!(snapshot.notes(), &BTreeMap::from([(64, 90)]));
        assert_eq!(snapshot.note_revision(), 3);
    }

    #[test]
    fn test_zero_velocity_note_on_releases() {
        let bus = MidiBus::new();
        let mut tracker = NoteTracker::new(bus.clone());
        tracker.handle(note_on(60, 100));
        tracker.handle(note_on(60, 0));
        assert!(bus.snapshot().notes().is_empty());
    }

    #[test]
    fn test_controls_do_not_touch_notes() {
        let bus = MidiBus::new();
        let mut tracker = NoteTracker::new(bus.clone());
        tracker.handle(MidiEvent::ControlChange {
            channel: 0,
            controller: 74,
            value: 12,
        });
        let snapshot = bus.snapshot();
        assert_eq!(snapshot.note_revision(), 0);
        assert_eq!(snapshot.control_revision(), 1);
        assert_eq!(snapshot.controls().get(&74), Some(&12));
    }

    #[test]
    fn test_channel_filter() {
        let bus = MidiBus::new();
        let mut tracker = NoteTracker::new(bus.clone()).with_channel(1);
        tracker.handle(note_on(60, 100));
        assert!(bus.snapshot().notes().is_empty());
        tracker.handle(MidiEvent::NoteOn {
            channel: 1,
            key: 60,
            velocity: 100,
        });
        assert_eq!(tracker.held().len(), 1);
    }
}
