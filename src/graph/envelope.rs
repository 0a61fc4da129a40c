use crate::dsp::envelope::{ExpEnvelope, LinearEnvelope};
use crate::error::EvalError;
use crate::graph::builder::{GraphBuilder, Operand};
use crate::graph::context::Context;
use crate::graph::node::{Node, NodeId, UnaryOp, Watch};
use crate::graph::Graph;

/*
Envelope Nodes
==============

An envelope node multiplies its input by a decaying level. The level is
re-armed when the gate rises: the gate is reduced to 0/1 and watched, and a
change to 1 is an edge. A gate that stays high does not re-trigger; it has
to fall first.

    gate    0  1  1  1  0  1
    edge       ^           ^

The `_beat` variants derive the gate from a beat signal through `trigger`,
so the envelope restarts on every whole beat:

    let beat = b.beat(128.0);
    let hat  = b.noise();
    let hat  = b.exp_envelope_beat(hat, beat);
*/

/// Watches a gate and reports rising edges.
#[derive(Debug, Clone, Default)]
struct GateEdge(Watch);

impl GateEdge {
    #[inline]
    fn rose(&mut self, gate: f64) -> bool {
        let high = UnaryOp::Bool.apply(gate);
        self.0.observe(high) && high == 1.0
    }
}

#[derive(Debug, Clone)]
pub struct EnvelopeNode {
    pub(crate) input: NodeId,
    pub(crate) time: NodeId,
    pub(crate) gate: NodeId,
    edge: GateEdge,
    envelope: LinearEnvelope,
}

impl EnvelopeNode {
    pub(crate) fn compute(&mut self, graph: &mut Graph, ctx: &mut Context) -> Result<f64, EvalError> {
        let gate = graph.eval(self.gate, ctx)?;
        if self.edge.rose(gate) {
            let time = graph.eval(self.time, ctx)?;
            self.envelope.trigger(time, ctx.sample_rate());
        }
        let level = self.envelope.next_level();
        Ok(level * graph.eval(self.input, ctx)?)
    }
}

#[derive(Debug, Clone)]
pub struct ExpEnvelopeNode {
    pub(crate) input: NodeId,
    pub(crate) gate: NodeId,
    edge: GateEdge,
    envelope: ExpEnvelope,
}

impl ExpEnvelopeNode {
    pub(crate) fn compute(&mut self, graph: &mut Graph, ctx: &mut Context) -> Result<f64, EvalError> {
        let gate = graph.eval(self.gate, ctx)?;
        if self.edge.rose(gate) {
            self.envelope.trigger();
        }
        let level = self.envelope.next_level();
        Ok(level * graph.eval(self.input, ctx)?)
    }
}

impl GraphBuilder {
    /// Linear decay over `time` seconds, restarted on each rising gate.
    pub fn envelope(
        &mut self,
        input: impl Into<Operand>,
        time: impl Into<Operand>,
        gate: impl Into<Operand>,
    ) -> NodeId {
        let input = self.input(input);
        let time = self.input(time);
        let gate = self.input(gate);
        self.push(Node::Envelope(EnvelopeNode {
            input,
            time,
            gate,
            edge: GateEdge::default(),
            envelope: LinearEnvelope::new(),
        }))
    }

    /// Fixed-ratio exponential decay, restarted on each rising gate.
    pub fn exp_envelope(&mut self, input: impl Into<Operand>, gate: impl Into<Operand>) -> NodeId {
        let input = self.input(input);
        let gate = self.input(gate);
        self.push(Node::ExpEnvelope(ExpEnvelopeNode {
            input,
            gate,
            edge: GateEdge::default(),
            envelope: ExpEnvelope::new(),
        }))
    }

    pub fn envelope_beat(
        &mut self,
        input: impl Into<Operand>,
        time: impl Into<Operand>,
        beat: impl Into<Operand>,
    ) -> NodeId {
        let gate = self.trigger(beat);
        self.envelope(input, time, gate)
    }

    pub fn exp_envelope_beat(&mut self, input: impl Into<Operand>, beat: impl Into<Operand>) -> NodeId {
        let gate = self.trigger(beat);
        self.exp_envelope(input, gate)
    }
}
