/*
Decay Envelopes
===============

Two one-shot decay envelopes used for plucks and percussion. Both are
re-armed by a gate rising edge and then fall on their own; there is no
attack, sustain or release stage.

Vocabulary
----------

  level   The envelope's current output value (0.0 to 1.0). This multiplies
          the audio signal to control its amplitude over time.

  edge    The tick where the gate goes from off to on. Edge detection lives
          in the graph node; these primitives only expose `trigger()`.

  rate    How much `level` falls per sample (linear envelope only).


Linear: straight line to zero
-----------------------------

  Level
    1.0 ┐╲
        │ ╲
        │  ╲
    0.0 └───╲────────→ Time
          time

    rate  = 1 / (time_seconds * sample_rate)
    level = max(0, level - rate)          every sample

Example: a 0.5 s decay at 44.1 kHz falls by 1/22050 per sample and reaches
silence exactly 22050 samples after the edge.


Exponential: fixed-ratio decay
------------------------------

  Level
    1.0 ┐╲
        │ ╲_
        │   ╲__
    0.0 └──────╲______→ Time

    level = level * 0.9999                every sample

The ratio is fixed regardless of any requested duration: the level halves
roughly every 6930 samples (about 157 ms at 44.1 kHz).
*/

/// Per-sample multiplier of the exponential envelope.
pub const EXP_DECAY: f64 = 0.9999;

#[derive(Debug, Clone, Default)]
pub struct LinearEnvelope {
    level: f64,
    rate: f64,
}

impl LinearEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Restart at full level, decaying to zero over `time_seconds`.
    pub fn trigger(&mut self, time_seconds: f64, sample_rate: f64) {
        self.level = 1.0;
        self.rate = 1.0 / (time_seconds * sample_rate);
    }

    #[inline]
    pub fn next_level(&mut self) -> f64 {
        self.level = (self.level - self.rate).max(0.0);
        self.level
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExpEnvelope {
    level: f64,
}

impl ExpEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn trigger(&mut self) {
        self.level = 1.0;
    }

    #[inline]
    pub fn next_level(&mut self) -> f64 {
        self.level *= EXP_DECAY;
        self.level
    }
}
