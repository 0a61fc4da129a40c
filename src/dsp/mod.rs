//! Low-level DSP primitives used by the graph nodes.
//!
//! These components hold only the signal-processing math and its state, one
//! sample at a time, in `f64`. Graph nodes layer operand evaluation, change
//! detection and caching on top.

/// Soft/hard saturators and the wavefolder.
pub mod distortion;
/// Linear and exponential decay envelopes.
pub mod envelope;
/// RBJ biquad family and single-pole allpass.
pub mod filter;
/// Growable circular store indexed by lag.
pub mod history;
/// Wet/dry interpolation.
pub mod mix;
/// Phase accumulator and waveform functions.
pub mod oscillator;

pub use filter::{Allpass, Biquad, BiquadCoefficients, BiquadKind};
pub use history::{HistoryBuffer, MAX_HISTORY_LAG};
pub use oscillator::{Phasor, Waveform};
