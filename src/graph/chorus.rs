use crate::graph::builder::{GraphBuilder, Operand};
use crate::graph::context::CHANNEL;
use crate::graph::node::NodeId;

/*
Chorus & Phaser
===============

Both effects are composites: they add ordinary nodes to the graph and have
no state of their own.

Chorus
------
A feedback-free delay whose time wobbles around a short base delay:

    time = base + diff · sine(rate) · interpolate(1, -1, channel)

The last factor is +1 on channel 0 and -1 on channel 1, so the two sides of
a stereo render move in opposite directions. The wet signal is mixed in at
one half.

  base  (~10 ms):  centre delay; short enough not to read as an echo
  diff  (~3 ms):   excursion; more means more detune
  rate  (Hz):      wobble speed, 0.3 - 2 Hz for classic chorus

Phaser
------
A cascade of allpass stages sharing one cutoff, crossfaded with the dry
signal. Each stage shifts phase without changing level, so the notches only
appear once the cascade is mixed back with the input.
*/

/// Default centre delay of [`GraphBuilder::chorus`], in seconds.
pub const CHORUS_BASE: f64 = 0.01;
/// Default excursion of [`GraphBuilder::chorus`], in seconds.
pub const CHORUS_DIFF: f64 = 0.003;
/// Default number of allpass stages of [`GraphBuilder::phaser`].
pub const PHASER_STAGES: usize = 12;

impl GraphBuilder {
    pub fn chorus(
        &mut self,
        input: impl Into<Operand>,
        rate: impl Into<Operand>,
        base: impl Into<Operand>,
        diff: impl Into<Operand>,
    ) -> NodeId {
        let input = self.input(input);
        let wobble = self.sine(rate);
        let side = self.interpolate(1.0, -1.0, CHANNEL);
        let swing = self.mul(diff, wobble);
        let swing = self.mul(swing, side);
        let time = self.add(base, swing);
        self.delay(input, time, 0.5, 0.0)
    }

    pub fn phaser(
        &mut self,
        input: impl Into<Operand>,
        cutoff: impl Into<Operand>,
        drywet: impl Into<Operand>,
        stages: usize,
    ) -> NodeId {
        let input = self.input(input);
        let cutoff = self.input(cutoff);
        let mut filtered = input;
        for _ in 0..stages {
            filtered = self.allpass(filtered, cutoff);
        }
        self.interpolate(input, filtered, drywet)
    }
}
