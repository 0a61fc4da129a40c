use std::f64::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Phase and Waveforms
===================

Every periodic source in the engine is a phase accumulator followed by a
waveform function. The accumulator owns the only state: a phase in [0, 1)
and the per-sample increment derived from the frequency.

    increment = frequency / sample_rate
    phase     = frac(phase + increment)

The waveform is a pure function of phase:

  Sine      sin(2π·phase)
  Cosine    cos(2π·phase)
  Square    +1 above half a cycle, -1 below
  Pulse     +1 above the duty width, -1 below
  SawUp     2·phase - 1            (rising ramp)
  SawDown   1 - 2·phase            (falling ramp)
  Triangle  4·phase - 1 on the way up, 3 - 4·phase on the way down

The increment is only recomputed when the observed frequency changes, so
a constant-pitch oscillator costs one add and one waveform evaluation per
sample.

Hard sync
---------
A synced oscillator watches another oscillator's phase. When the source
wraps (its phase this tick is below its phase last tick) the follower's
phase is reset to zero before advancing.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Cosine,
    Square,
    Pulse,
    SawUp,
    SawDown,
    Triangle,
}

impl Waveform {
    /// Evaluate the waveform at `phase`. `width` is only read by `Pulse`.
    #[inline]
    pub fn sample(self, phase: f64, width: f64) -> f64 {
        match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Cosine => (phase * TAU).cos(),
            Waveform::Square => {
                if phase > 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Pulse => {
                if phase > width {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::SawUp => 2.0 * phase - 1.0,
            Waveform::SawDown => -2.0 * phase + 1.0,
            Waveform::Triangle => {
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    -4.0 * phase + 3.0
                }
            }
        }
    }

    pub const ALL: [Waveform; 7] = [
        Waveform::Sine,
        Waveform::Cosine,
        Waveform::Square,
        Waveform::Pulse,
        Waveform::SawUp,
        Waveform::SawDown,
        Waveform::Triangle,
    ];

    /// Inverse of [`Waveform::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Cosine => "cosine",
            Waveform::Square => "square",
            Waveform::Pulse => "pulse",
            Waveform::SawUp => "saw_up",
            Waveform::SawDown => "saw_down",
            Waveform::Triangle => "triangle",
        }
    }
}

/// Phase accumulator shared by all periodic sources.
#[derive(Debug, Clone, Default)]
pub struct Phasor {
    phase: f64,
    increment: f64,
}

impl Phasor {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    #[inline]
    pub fn increment(&self) -> f64 {
        self.increment
    }

    pub fn set_frequency(&mut self, frequency: f64, sample_rate: f64) {
        self.increment = frequency / sample_rate;
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Advance one sample and return the wrapped phase.
    #[inline]
    pub fn advance(&mut self) -> f64 {
        let next = self.phase + self.increment;
        let wrapped = next - next.floor();
        // Tiny negative phases can round up to exactly 1.0.
        self.phase = if wrapped.is_finite() && wrapped < 1.0 {
            wrapped
        } else {
            0.0
        };
        self.phase
    }
}
