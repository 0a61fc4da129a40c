// Purpose: MIDI hand-off between the ingestion thread and the render thread.
// Ingestion turns events into immutable snapshots; the render thread only
// ever reads the latest one.

pub mod ingest;
pub mod snapshot;

pub use ingest::NoteTracker;
pub use snapshot::{MidiBus, MidiSnapshot};
