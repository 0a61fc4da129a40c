use rand::rngs::StdRng;
use rand::Rng;

use crate::dsp::{Phasor, Waveform};
use crate::error::EvalError;
use crate::graph::builder::{GraphBuilder, Operand};
use crate::graph::context::Context;
use crate::graph::node::{Node, NodeId, Watch};
use crate::graph::Graph;

/*
Oscillator Nodes
================

Every periodic source is a phase accumulator plus a waveform shape:

    phase += frequency / sample_rate      (wrapped into [0, 1))
    out    = shape(phase)

The frequency operand is watched: the increment is recomputed only on ticks
where its value differs from the previous evaluation, and the new increment
already applies to that tick's advance.

Hard sync
---------
An oscillator may follow another oscillator ("sync source"). The source is
evaluated first; when its phase is lower than on the previous tick it has
wrapped, and this oscillator's phase restarts from 0 before advancing.

    let master = b.saw_up(110.0);
    let slave  = b.synced(Waveform::SawUp, 287.0, master);

Noise
-----
Uniform in [-1, 1), no memory. Each noise node owns an RNG seeded from the
builder, so seeded builds render the same noise.
*/

#[derive(Debug, Clone)]
pub struct OscNode {
    pub(crate) waveform: Waveform,
    pub(crate) frequency: NodeId,
    pub(crate) width: Option<NodeId>,
    pub(crate) sync: Option<NodeId>,
    phasor: Phasor,
    watch: Watch,
    last_sync_phase: f64,
}

impl OscNode {
    fn new(waveform: Waveform, frequency: NodeId) -> Self {
        Self {
            waveform,
            frequency,
            width: None,
            sync: None,
            phasor: Phasor::new(),
            watch: Watch::default(),
            // Any first source phase is below 1, so a synced oscillator
            // starts in step with its source.
            last_sync_phase: 1.0,
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    #[inline]
    pub fn phase(&self) -> f64 {
        self.phasor.phase()
    }

    pub(crate) fn operands(&self) -> Vec<NodeId> {
        let mut ids = vec![self.frequency];
        ids.extend(self.width);
        ids.extend(self.sync);
        ids
    }

    pub(crate) fn compute(&mut self, graph: &mut Graph, ctx: &mut Context) -> Result<f64, EvalError> {
        let frequency = graph.eval(self.frequency, ctx)?;
        if self.watch.observe(frequency) {
            self.phasor.set_frequency(frequency, ctx.sample_rate());
        }

        if let Some(source) = self.sync {
            graph.eval(source, ctx)?;
            let source_phase = graph.oscillator_phase(source).unwrap_or(0.0);
            if source_phase < self.last_sync_phase {
                self.phasor.reset();
            }
            self.last_sync_phase = source_phase;
        }

        let phase = self.phasor.advance();
        let width = match self.width {
            Some(width) => graph.eval(width, ctx)?,
            None => 0.5,
        };
        Ok(self.waveform.sample(phase, width))
    }
}

#[derive(Debug, Clone)]
pub struct NoiseNode {
    rng: StdRng,
}

impl NoiseNode {
    #[inline]
    pub(crate) fn compute(&mut self) -> f64 {
        self.rng.random_range(-1.0..1.0)
    }

    pub(crate) fn reseed(&mut self, rng: StdRng) {
        self.rng = rng;
    }
}

impl GraphBuilder {
    pub fn oscillator(&mut self, waveform: Waveform, frequency: impl Into<Operand>) -> NodeId {
        let frequency = self.input(frequency);
        self.push(Node::Oscillator(OscNode::new(waveform, frequency)))
    }

    pub fn sine(&mut self, frequency: impl Into<Operand>) -> NodeId {
        self.oscillator(Waveform::Sine, frequency)
    }

    pub fn cosine(&mut self, frequency: impl Into<Operand>) -> NodeId {
        self.oscillator(Waveform::Cosine, frequency)
    }

    pub fn square(&mut self, frequency: impl Into<Operand>) -> NodeId {
        self.oscillator(Waveform::Square, frequency)
    }

    /// Square wave that is high while the phase is above `width`.
    pub fn pulse(&mut self, frequency: impl Into<Operand>, width: impl Into<Operand>) -> NodeId {
        let frequency = self.input(frequency);
        let width = self.input(width);
        let mut osc = OscNode::new(Waveform::Pulse, frequency);
        osc.width = Some(width);
        self.push(Node::Oscillator(osc))
    }

    pub fn saw_up(&mut self, frequency: impl Into<Operand>) -> NodeId {
        self.oscillator(Waveform::SawUp, frequency)
    }

    pub fn saw_down(&mut self, frequency: impl Into<Operand>) -> NodeId {
        self.oscillator(Waveform::SawDown, frequency)
    }

    pub fn triangle(&mut self, frequency: impl Into<Operand>) -> NodeId {
        self.oscillator(Waveform::Triangle, frequency)
    }

    /// Oscillator hard-synced to `source`, which must be an oscillator of
    /// the same graph (checked by `finish`).
    pub fn synced(
        &mut self,
        waveform: Waveform,
        frequency: impl Into<Operand>,
        source: NodeId,
    ) -> NodeId {
        let frequency = self.input(frequency);
        let mut osc = OscNode::new(waveform, frequency);
        osc.sync = Some(source);
        self.push(Node::Oscillator(osc))
    }

    pub fn noise(&mut self) -> NodeId {
        let rng = self.fork_rng();
        self.push(Node::Noise(NoiseNode { rng }))
    }
}
