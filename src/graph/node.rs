use std::fmt;

use crate::error::EvalError;
use crate::graph::call::{CallNode, VoicesNode};
use crate::graph::context::Context;
use crate::graph::control::{
    GlissandoNode, RandomWalkNode, RhythmNode, SampleHoldNode, TriggerNode,
};
use crate::graph::delay::HistoryNode;
use crate::graph::distortion::{SaturateNode, WavefoldNode};
use crate::graph::envelope::{EnvelopeNode, ExpEnvelopeNode};
use crate::graph::filter::{AllpassNode, BiquadNode};
use crate::graph::oscillator::{NoiseNode, OscNode};
use crate::graph::pan::{Pan2dNode, PanNode};
use crate::graph::pitch::DiatonicNode;
use crate::graph::Graph;
use crate::sequencing::ScaleMask;

/// Stable identity of a node inside one graph; also its cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Floored modulo: the result takes the sign of the divisor.
    Rem,
}

impl BinaryOp {
    #[inline]
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
            BinaryOp::Rem => lhs - rhs * (lhs / rhs).floor(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    /// Truncate toward zero.
    Int,
    /// 1 for any non-zero input, else 0.
    Bool,
}

impl UnaryOp {
    #[inline]
    pub fn apply(self, value: f64) -> f64 {
        match self {
            UnaryOp::Neg => -value,
            UnaryOp::Int => value.trunc(),
            UnaryOp::Bool => {
                if value != 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Per-consumer change detection: the first observation counts as a change.
#[derive(Debug, Clone, Default)]
pub(crate) struct Watch(Option<f64>);

impl Watch {
    #[inline]
    pub(crate) fn observe(&mut self, value: f64) -> bool {
        let changed = self.0 != Some(value);
        self.0 = Some(value);
        changed
    }
}

/// One operator in the graph arena.
///
/// Operands are `NodeId`s of earlier nodes in the same graph, so the arena is
/// always in topological order. Cycles only exist through feedback slots,
/// which read last tick's register instead of a node.
#[derive(Debug, Clone)]
pub enum Node {
    Const(f64),
    Load(String),
    Store { name: String, value: NodeId },
    Unary { op: UnaryOp, input: NodeId },
    Binary { op: BinaryOp, lhs: NodeId, rhs: NodeId },
    FeedbackRead { slot: u32 },
    FeedbackWrite { slot: u32, value: NodeId },
    Oscillator(OscNode),
    Noise(NoiseNode),
    Biquad(BiquadNode),
    Allpass(AllpassNode),
    Saturate(SaturateNode),
    Wavefold(WavefoldNode),
    Interpolate { dry: NodeId, wet: NodeId, ratio: NodeId },
    Mix(Vec<NodeId>),
    History(HistoryNode),
    Pan(PanNode),
    Pan2d(Pan2dNode),
    Beat { bpm: NodeId },
    Trigger(TriggerNode),
    Switcher { index: NodeId, branches: Vec<NodeId> },
    Rhythm(RhythmNode),
    SampleHold(SampleHoldNode),
    Glissando(GlissandoNode),
    RandomWalk(RandomWalkNode),
    Envelope(EnvelopeNode),
    ExpEnvelope(ExpEnvelopeNode),
    Diatonic(DiatonicNode),
    Scale { note: NodeId, mask: ScaleMask },
    Call(CallNode),
    Voices(VoicesNode),
}

impl Default for Node {
    fn default() -> Self {
        Node::Const(0.0)
    }
}

impl Node {
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Const(_) => "const",
            Node::Load(_) => "load",
            Node::Store { .. } => "store",
            Node::Unary { .. } => "unary",
            Node::Binary { .. } => "binary",
            Node::FeedbackRead { .. } => "feedback_read",
            Node::FeedbackWrite { .. } => "feedback_write",
            Node::Oscillator(_) => "oscillator",
            Node::Noise(_) => "noise",
            Node::Biquad(_) => "biquad",
            Node::Allpass(_) => "allpass",
            Node::Saturate(_) => "saturate",
            Node::Wavefold(_) => "wavefold",
            Node::Interpolate { .. } => "interpolate",
            Node::Mix(_) => "mix",
            Node::History(_) => "history",
            Node::Pan(_) => "pan",
            Node::Pan2d(_) => "pan2d",
            Node::Beat { .. } => "beat",
            Node::Trigger(_) => "trigger",
            Node::Switcher { .. } => "switcher",
            Node::Rhythm(_) => "rhythm",
            Node::SampleHold(_) => "sample_hold",
            Node::Glissando(_) => "glissando",
            Node::RandomWalk(_) => "random_walk",
            Node::Envelope(_) => "envelope",
            Node::ExpEnvelope(_) => "exp_envelope",
            Node::Diatonic(_) => "diatonic",
            Node::Scale { .. } => "scale",
            Node::Call(_) => "call",
            Node::Voices(_) => "voices",
        }
    }

    /// Every node this one may evaluate, in no particular order.
    pub fn operands(&self) -> Vec<NodeId> {
        match self {
            Node::Const(_) | Node::Load(_) | Node::FeedbackRead { .. } | Node::Noise(_) => {
                Vec::new()
            }
            Node::Store { value, .. } | Node::FeedbackWrite { value, .. } => vec![*value],
            Node::Unary { input, .. } => vec![*input],
            Node::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            Node::Oscillator(osc) => osc.operands(),
            Node::Biquad(f) => vec![f.input, f.cutoff, f.resonance],
            Node::Allpass(f) => vec![f.input, f.cutoff],
            Node::Saturate(s) => vec![s.input, s.cutoff],
            Node::Wavefold(w) => vec![w.input, w.folds, w.gain, w.base],
            Node::Interpolate { dry, wet, ratio } => vec![*dry, *wet, *ratio],
            Node::Mix(inputs) => inputs.clone(),
            Node::History(h) => vec![h.input, h.lag],
            Node::Pan(p) => vec![p.input, p.position],
            Node::Pan2d(p) => vec![p.input, p.x, p.y],
            Node::Beat { bpm } => vec![*bpm],
            Node::Trigger(t) => vec![t.beat],
            Node::Switcher { index, branches } => {
                let mut ids = vec![*index];
                ids.extend_from_slice(branches);
                ids
            }
            Node::Rhythm(r) => vec![r.beat],
            Node::SampleHold(s) => vec![s.trigger, s.signal],
            Node::Glissando(g) => vec![g.target, g.step, g.trigger],
            Node::RandomWalk(w) => vec![w.trigger],
            Node::Envelope(e) => vec![e.input, e.time, e.gate],
            Node::ExpEnvelope(e) => vec![e.input, e.gate],
            Node::Diatonic(d) => vec![d.note],
            Node::Scale { note, .. } => vec![*note],
            Node::Call(call) => call.operands(),
            Node::Voices(_) => Vec::new(),
        }
    }

    /// Kind-specific computation. Only `Graph::eval` calls this, after the
    /// cache check, so it runs at most once per node per tick.
    pub(crate) fn compute(&mut self, graph: &mut Graph, ctx: &mut Context) -> Result<f64, EvalError> {
        match self {
            Node::Const(value) => Ok(*value),
            Node::Load(name) => Ok(ctx.load(name)),
            Node::Store { name, value } => {
                let value = graph.eval(*value, ctx)?;
                Ok(ctx.store(name, value))
            }
            Node::Unary { op, input } => Ok(op.apply(graph.eval(*input, ctx)?)),
            Node::Binary { op, lhs, rhs } => {
                let lhs = graph.eval(*lhs, ctx)?;
                let rhs = graph.eval(*rhs, ctx)?;
                Ok(op.apply(lhs, rhs))
            }
            Node::FeedbackRead { slot } => Ok(graph.read_register(*slot)),
            Node::FeedbackWrite { slot, value } => {
                let value = graph.eval(*value, ctx)?;
                graph.write_register(*slot, value);
                Ok(value)
            }
            Node::Oscillator(osc) => osc.compute(graph, ctx),
            Node::Noise(noise) => Ok(noise.compute()),
            Node::Biquad(filter) => filter.compute(graph, ctx),
            Node::Allpass(filter) => filter.compute(graph, ctx),
            Node::Saturate(shaper) => shaper.compute(graph, ctx),
            Node::Wavefold(folder) => folder.compute(graph, ctx),
            Node::Interpolate { dry, wet, ratio } => {
                let dry = graph.eval(*dry, ctx)?;
                let wet = graph.eval(*wet, ctx)?;
                let ratio = graph.eval(*ratio, ctx)?;
                Ok(crate::dsp::mix::interpolate(dry, wet, ratio))
            }
            Node::Mix(inputs) => {
                let mut sum = 0.0;
                for &input in inputs.iter() {
                    sum += graph.eval(input, ctx)?;
                }
                Ok(sum)
            }
            Node::History(history) => history.compute(graph, ctx),
            Node::Pan(pan) => pan.compute(graph, ctx),
            Node::Pan2d(pan) => pan.compute(graph, ctx),
            Node::Beat { bpm } => {
                let bpm = graph.eval(*bpm, ctx)?;
                Ok(crate::graph::control::beat_at(ctx, bpm))
            }
            Node::Trigger(trigger) => trigger.compute(graph, ctx),
            Node::Switcher { index, branches } => {
                let index = graph.eval(*index, ctx)?.floor();
                let pick = (index as i64).rem_euclid(branches.len() as i64) as usize;
                graph.eval(branches[pick], ctx)
            }
            Node::Rhythm(rhythm) => rhythm.compute(graph, ctx),
            Node::SampleHold(hold) => hold.compute(graph, ctx),
            Node::Glissando(glide) => glide.compute(graph, ctx),
            Node::RandomWalk(walk) => walk.compute(graph, ctx),
            Node::Envelope(env) => env.compute(graph, ctx),
            Node::ExpEnvelope(env) => env.compute(graph, ctx),
            Node::Diatonic(pitch) => pitch.compute(graph, ctx),
            Node::Scale { note, mask } => Ok(mask.quantize(graph.eval(*note, ctx)?)),
            Node::Call(call) => call.compute(graph, ctx),
            Node::Voices(voices) => voices.compute(ctx),
        }
    }
}
