use crate::error::EvalError;
use crate::graph::builder::{GraphBuilder, Operand};
use crate::graph::context::Context;
use crate::graph::node::{Node, NodeId, Watch};
use crate::graph::Graph;
use crate::sequencing::pitch::{diatonic, A4_FREQ, A4_NOTE};
use crate::sequencing::ScaleMask;

#[derive(Debug, Clone)]
pub struct DiatonicNode {
    pub(crate) note: NodeId,
    base: f64,
    reference: f64,
    watch: Watch,
    frequency: f64,
}

impl DiatonicNode {
    pub(crate) fn compute(&mut self, graph: &mut Graph, ctx: &mut Context) -> Result<f64, EvalError> {
        let note = graph.eval(self.note, ctx)?;
        if self.watch.observe(note) {
            self.frequency = diatonic(note, self.base, self.reference);
        }
        Ok(self.frequency)
    }
}

impl GraphBuilder {
    /// Equal-tempered frequency of a MIDI note number, A4 = 440 Hz.
    pub fn diatonic(&mut self, note: impl Into<Operand>) -> NodeId {
        self.diatonic_with(note, A4_FREQ, A4_NOTE)
    }

    /// Frequency of `note` against a custom reference: `base` Hz at
    /// `reference`.
    pub fn diatonic_with(&mut self, note: impl Into<Operand>, base: f64, reference: f64) -> NodeId {
        let note = self.input(note);
        self.push(Node::Diatonic(DiatonicNode {
            note,
            base,
            reference,
            watch: Watch::default(),
            frequency: 0.0,
        }))
    }

    /// Truncate `note` and step it down onto the nearest allowed pitch class.
    pub fn scale(&mut self, note: impl Into<Operand>, mask: ScaleMask) -> NodeId {
        let note = self.input(note);
        self.push(Node::Scale { note, mask })
    }
}
