use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

/// Immutable view of the MIDI state, published as a whole.
///
/// Revisions count publications of each half: a new note revision means the
/// set of held notes was replaced (even with an identical set), a new control
/// revision means at least one controller moved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MidiSnapshot {
    notes: BTreeMap<u8, u8>,
    controls: BTreeMap<u8, u8>,
    note_revision: u64,
    control_revision: u64,
}

impl MidiSnapshot {
    /// Held notes mapped to their velocity, lowest note first.
    pub fn notes(&self) -> &BTreeMap<u8, u8> {
        &self.notes
    }

    pub fn velocity(&self, note: u8) -> Option<u8> {
        self.notes.get(&note).copied()
    }

    /// Last value seen per controller.
    pub fn controls(&self) -> &BTreeMap<u8, u8> {
        &self.controls
    }

    pub fn note_revision(&self) -> u64 {
        self.note_revision
    }

    pub fn control_revision(&self) -> u64 {
        self.control_revision
    }
}

/// Publication point between the MIDI thread and the render thread.
///
/// Writers build a new snapshot and swap it in; the render thread loads the
/// current one once per frame and never waits on a writer.
#[derive(Debug, Clone, Default)]
pub struct MidiBus {
    current: Arc<ArcSwap<MidiSnapshot>>,
}

impl MidiBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole set of held notes.
    pub fn replace_active_notes(&self, notes: BTreeMap<u8, u8>) {
        self.current.rcu(|current| {
            let mut next = MidiSnapshot::clone(current);
            next.notes = notes.clone();
            next.note_revision += 1;
            next
        });
    }

    pub fn set_control(&self, controller: u8, value: u8) {
        self.current.rcu(|current| {
            let mut next = MidiSnapshot::clone(current);
            next.controls.insert(controller, value);
            next.control_revision += 1;
            next
        });
    }

    pub fn snapshot(&self) -> Arc<MidiSnapshot> {
        self.current.load_full()
    }
}
