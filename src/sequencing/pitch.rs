//! Note number to frequency conversion.
//!
//! A4 = 440 Hz = MIDI note 69. Each semitone multiplies the frequency by the
//! twelfth root of two, and fractional notes give microtonal pitches.

pub const A4_FREQ: f64 = 440.0;
pub const A4_NOTE: f64 = 69.0;

/// `base_freq · 2^((note - reference_note) / 12)`
#[inline]
pub fn diatonic(note: f64, base_freq: f64, reference_note: f64) -> f64 {
    base_freq * 2.0_f64.powf((note - reference_note) / 12.0)
}

/// Equal-tempered frequency of a MIDI note against A4 = 440 Hz.
#[inline]
pub fn midi_note_to_freq(note: f64) -> f64 {
    diatonic(note, A4_FREQ, A4_NOTE)
}
