use crate::dsp::{Allpass, Biquad, BiquadCoefficients, BiquadKind};
use crate::error::EvalError;
use crate::graph::builder::{GraphBuilder, Operand};
use crate::graph::context::Context;
use crate::graph::node::{Node, NodeId, Watch};
use crate::graph::Graph;

/*
Filter Nodes
============

Biquads take three operands: input, cutoff (Hz) and resonance (Q). Cutoff
and Q are watched separately; the coefficients are redesigned on any tick
where either one changed, so a filter with constant settings designs once
and keeps bit-identical coefficients for the rest of its life.

    let dark = b.lowpass(saw, 800.0, 0.707);
    let wah  = b.bandpass(saw, swept_cutoff, 4.0);

The allpass reads its cutoff every tick; its coefficient is a single
division, so there is nothing to cache.
*/

#[derive(Debug, Clone)]
pub struct BiquadNode {
    pub(crate) input: NodeId,
    pub(crate) cutoff: NodeId,
    pub(crate) resonance: NodeId,
    filter: Biquad,
    cutoff_watch: Watch,
    resonance_watch: Watch,
}

impl BiquadNode {
    pub fn kind(&self) -> BiquadKind {
        self.filter.kind()
    }

    pub fn coefficients(&self) -> BiquadCoefficients {
        self.filter.coefficients()
    }

    pub(crate) fn compute(&mut self, graph: &mut Graph, ctx: &mut Context) -> Result<f64, EvalError> {
        let cutoff = graph.eval(self.cutoff, ctx)?;
        let resonance = graph.eval(self.resonance, ctx)?;
        // Both watches must see every value, so no short-circuit here.
        let cutoff_changed = self.cutoff_watch.observe(cutoff);
        let resonance_changed = self.resonance_watch.observe(resonance);
        if cutoff_changed || resonance_changed {
            self.filter.design(cutoff, resonance, ctx.sample_rate());
        }
        let input = graph.eval(self.input, ctx)?;
        Ok(self.filter.next_sample(input))
    }
}

#[derive(Debug, Clone)]
pub struct AllpassNode {
    pub(crate) input: NodeId,
    pub(crate) cutoff: NodeId,
    filter: Allpass,
}

impl AllpassNode {
    pub(crate) fn compute(&mut self, graph: &mut Graph, ctx: &mut Context) -> Result<f64, EvalError> {
        let cutoff = graph.eval(self.cutoff, ctx)?;
        let input = graph.eval(self.input, ctx)?;
        Ok(self.filter.next_sample(input, cutoff, ctx.sample_rate()))
    }
}

impl GraphBuilder {
    pub fn biquad(
        &mut self,
        kind: BiquadKind,
        input: impl Into<Operand>,
        cutoff: impl Into<Operand>,
        resonance: impl Into<Operand>,
    ) -> NodeId {
        let input = self.input(input);
        let cutoff = self.input(cutoff);
        let resonance = self.input(resonance);
        self.push(Node::Biquad(BiquadNode {
            input,
            cutoff,
            resonance,
            filter: Biquad::new(kind),
            cutoff_watch: Watch::default(),
            resonance_watch: Watch::default(),
        }))
    }

    pub fn lowpass(
        &mut self,
        input: impl Into<Operand>,
        cutoff: impl Into<Operand>,
        resonance: impl Into<Operand>,
    ) -> NodeId {
        self.biquad(BiquadKind::LowPass, input, cutoff, resonance)
    }

    pub fn highpass(
        &mut self,
        input: impl Into<Operand>,
        cutoff: impl Into<Operand>,
        resonance: impl Into<Operand>,
    ) -> NodeId {
        self.biquad(BiquadKind::HighPass, input, cutoff, resonance)
    }

    pub fn bandpass(
        &mut self,
        input: impl Into<Operand>,
        cutoff: impl Into<Operand>,
        resonance: impl Into<Operand>,
    ) -> NodeId {
        self.biquad(BiquadKind::BandPass, input, cutoff, resonance)
    }

    pub fn notch(
        &mut self,
        input: impl Into<Operand>,
        cutoff: impl Into<Operand>,
        resonance: impl Into<Operand>,
    ) -> NodeId {
        self.biquad(BiquadKind::Notch, input, cutoff, resonance)
    }

    pub fn allpass(&mut self, input: impl Into<Operand>, cutoff: impl Into<Operand>) -> NodeId {
        let input = self.input(input);
        let cutoff = self.input(cutoff);
        self.push(Node::Allpass(AllpassNode {
            input,
            cutoff,
            filter: Allpass::new(),
        }))
    }
}
