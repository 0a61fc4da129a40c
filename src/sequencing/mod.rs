//! Musical helpers: pitch conversion, scale quantization and rhythm patterns.

pub mod pitch;
pub mod rhythm;
pub mod scale;

pub use pitch::{diatonic, midi_note_to_freq};
pub use rhythm::RhythmPattern;
pub use scale::{ScaleMask, SCALE_NAMES};
