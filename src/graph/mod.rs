//! The expression graph and its per-tick evaluation engine.
//!
//! A [`Graph`] is an arena of [`Node`]s in topological order plus a root. It
//! is produced by a [`GraphBuilder`], evaluated once per tick through
//! [`Graph::tick`], and never mutated structurally afterwards: a new
//! definition means a new graph.
//!
//! # Caching
//!
//! Every node has a memo slot stamped with the context epoch it was last
//! computed in. [`Graph::eval`] returns the memoized value when the stamp
//! matches the current epoch and otherwise runs the node's computation, so a
//! node shared by many consumers computes (and advances its state) at most
//! once per tick, and a node nobody reaches that tick does not run at all.
//!
//! # Feedback
//!
//! Cycles are expressed with feedback slots (see
//! [`GraphBuilder::feedback_slot`]). Each slot is a double-buffered register:
//! writes land in the pending half, reads see the visible half, and
//! [`Graph::tick`] promotes pending to visible before evaluating the root.
//! A read therefore always sees the value written on the previous tick,
//! whatever order the two sides are evaluated in.
//!
//! Epochs are only comparable within one [`Context`]. A graph remembers the
//! context that last ticked it and drops its memo when a different one takes
//! over.

/// Feedback slots, arithmetic and the builder itself.
pub mod builder;
/// Parametrized sub-graphs, function calls, chords and MIDI voices.
pub mod call;
/// Chorus and phaser composites built from delays and allpasses.
pub mod chorus;
/// Symbol table, tick epoch and MIDI hand-off.
pub mod context;
/// Beat clock, triggers and other sequencing nodes.
pub mod control;
/// History reads and feedback delay.
pub mod delay;
/// Saturators and wavefolder nodes.
pub mod distortion;
/// Gate-triggered decay envelopes.
pub mod envelope;
/// Biquad and allpass filter nodes.
pub mod filter;
/// Node model and dispatch.
pub mod node;
/// Phase-accumulating oscillators and noise.
pub mod oscillator;
/// Stereo and binaural placement.
pub mod pan;
/// Note-to-frequency and scale quantization nodes.
pub mod pitch;

pub use builder::{FeedbackResolver, GraphBuilder, Operand};
pub use call::Template;
pub use context::Context;
pub use node::{BinaryOp, Node, NodeId, UnaryOp};

use rand::rngs::StdRng;

use crate::error::EvalError;
use crate::graph::builder::fork;

#[derive(Debug, Clone, Copy, Default)]
struct Memo {
    epoch: u64,
    value: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Register {
    visible: f64,
    pending: f64,
}

#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    memo: Vec<Memo>,
    registers: Vec<Register>,
    root: NodeId,
    context: Option<u64>,
}

impl Graph {
    pub(crate) fn from_parts(nodes: Vec<Node>, registers: usize, root: NodeId) -> Self {
        let memo = vec![Memo::default(); nodes.len()];
        Self {
            nodes,
            memo,
            registers: vec![Register::default(); registers],
            root,
            context: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Evaluate one tick: promote feedback registers, then pull the root.
    ///
    /// The caller must have started the tick with [`Context::begin_tick`].
    pub fn tick(&mut self, ctx: &mut Context) -> Result<f64, EvalError> {
        if self.context != Some(ctx.id()) {
            self.memo.fill(Memo::default());
            self.context = Some(ctx.id());
        }
        for register in &mut self.registers {
            register.visible = register.pending;
        }
        self.eval(self.root, ctx)
    }

    /// Evaluate `id` for the current tick, computing it at most once.
    pub fn eval(&mut self, id: NodeId, ctx: &mut Context) -> Result<f64, EvalError> {
        let index = id.index();
        let epoch = ctx.epoch();
        match self.memo.get(index) {
            None => return Err(EvalError::UnknownNode(id.0)),
            Some(memo) if memo.epoch == epoch => return Ok(memo.value),
            Some(_) => {}
        }

        // Operands always sit at lower indices, so the vacated slot is never
        // re-entered while this node computes.
        let mut node = std::mem::take(&mut self.nodes[index]);
        let result = node.compute(self, ctx);
        self.nodes[index] = node;

        let value = result?;
        self.memo[index] = Memo { epoch, value };
        Ok(value)
    }

    /// Values currently visible to feedback reads, by slot.
    pub fn registers(&self) -> Vec<f64> {
        self.registers.iter().map(|r| r.visible).collect()
    }

    /// Carry feedback state over from the graph this one replaces. Slots are
    /// matched by index; extra slots on either side are left alone.
    pub fn adopt_registers(&mut self, previous: &Graph) {
        for (mine, theirs) in self.registers.iter_mut().zip(&previous.registers) {
            *mine = *theirs;
        }
    }

    /// Give every random node (including those inside calls and voices) a
    /// fresh generator drawn from `rng`.
    pub(crate) fn reseed(&mut self, rng: &mut StdRng) {
        for node in &mut self.nodes {
            match node {
                Node::Noise(noise) => noise.reseed(fork(rng)),
                Node::RandomWalk(walk) => walk.reseed(fork(rng)),
                Node::Call(call) => call.reseed(rng),
                Node::Voices(voices) => voices.reseed(fork(rng)),
                _ => {}
            }
        }
    }

    /// Phase of the oscillator at `id`, if it is one.
    pub fn oscillator_phase(&self, id: NodeId) -> Option<f64> {
        match self.nodes.get(id.index()) {
            Some(Node::Oscillator(osc)) => Some(osc.phase()),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn read_register(&self, slot: u32) -> f64 {
        self.registers
            .get(slot as usize)
            .map_or(0.0, |r| r.visible)
    }

    #[inline]
    pub(crate) fn write_register(&mut self, slot: u32, value: f64) {
        if let Some(register) = self.registers.get_mut(slot as usize) {
            register.pending = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Context {
        Context::new(100.0, 1)
    }

    #[test]
    fn test_shared_node_computes_once_per_tick() {
        let mut b = GraphBuilder::with_seed(1);
        let osc = b.saw_up(10.0);
        let root = b.add(osc, osc);
        let mut graph = b.finish(root).unwrap();
        let mut ctx = ctx();

        for sample in 0..5 {
            ctx.begin_tick(sample, 0);
            graph.tick(&mut ctx).unwrap();
        }
        // Five advances of 10/100, not ten.
        let phase = graph.oscillator_phase(osc).unwrap();
        assert!((phase - 0.5).abs() < 1e-12, "phase was {}", phase);
    }

    #[test]
    fn test_new_context_does_not_see_stale_memo() {
        let mut b = GraphBuilder::with_seed(1);
        let root = b.reference("x");
        let mut graph = b.finish(root).unwrap();

        // Both contexts are on their first tick, so their epochs coincide.
        let mut first = ctx();
        first.store("x", 1.0);
        first.begin_tick(0, 0);
        assert_eq!(graph.tick(&mut first).unwrap(), 1.0);

        let mut second = ctx();
        second.store("x", 2.0);
        second.begin_tick(0, 0);
        assert_eq!(second.epoch(), first.epoch());
        assert_eq!(graph.tick(&mut second).unwrap(), 2.0);
    }

    #[test]
    fn test_unreached_nodes_do_not_advance() {
        let mut b = GraphBuilder::with_seed(1);
        let idle = b.saw_up(10.0);
        let live = b.saw_up(10.0);
        let root = b.switcher(0.0, vec![live, idle]);
        let mut graph = b.finish(root).unwrap();
        let mut ctx = ctx();

        for sample in 0..3 {
            ctx.begin_tick(sample, 0);
            graph.tick(&mut ctx).unwrap();
        }
        assert_eq!(graph.oscillator_phase(idle), Some(0.0));
        assert!((graph.oscillator_phase(live).unwrap() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_repeated_eval_in_one_tick_hits_cache() {
        let mut b = GraphBuilder::with_seed(1);
        let osc = b.saw_up(10.0);
        let mut graph = b.finish(osc).unwrap();
        let mut ctx = ctx();

        ctx.begin_tick(0, 0);
        let first = graph.eval(osc, &mut ctx).unwrap();
        let second = graph.eval(osc, &mut ctx).unwrap();
        assert_eq!(first, second);
        ctx.begin_tick(1, 0);
        assert_ne!(graph.eval(osc, &mut ctx).unwrap(), first);
    }

    #[test]
    fn test_feedback_reads_previous_tick() {
        // counter = previous(counter) + 1
        let mut b = GraphBuilder::with_seed(1);
        let (previous, close) = b.feedback_slot();
        let next = b.add(previous, 1.0);
        let counter = close.resolve(&mut b, next);
        let mut graph = b.finish(counter).unwrap();
        let mut ctx = ctx();

        let values: Vec<f64> = (0..4)
            .map(|sample| {
                ctx.begin_tick(sample, 0);
                graph.tick(&mut ctx).unwrap()
            })
            .collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_feedback_read_after_write_still_lags() {
        // The read side is evaluated after the write in the same tick.
        let mut b = GraphBuilder::with_seed(1);
        let (previous, close) = b.feedback_slot();
        let clock = b.reference(context::SAMPLE);
        let written = close.resolve(&mut b, clock);
        let root = b.sub(written, previous);
        let mut graph = b.finish(root).unwrap();
        let mut ctx = ctx();

        ctx.begin_tick(0, 0);
        assert_eq!(graph.tick(&mut ctx).unwrap(), 0.0);
        for sample in 1..5 {
            ctx.begin_tick(sample, 0);
            assert_eq!(graph.tick(&mut ctx).unwrap(), 1.0);
        }
    }

    #[test]
    fn test_adopted_registers_survive_rebuild() {
        let build = || {
            let mut b = GraphBuilder::with_seed(1);
            let (previous, close) = b.feedback_slot();
            let next = b.add(previous, 1.0);
            let counter = close.resolve(&mut b, next);
            b.finish(counter).unwrap()
        };
        let mut old = build();
        let mut ctx = ctx();
        for sample in 0..3 {
            ctx.begin_tick(sample, 0);
            old.tick(&mut ctx).unwrap();
        }

        let mut new = build();
        new.adopt_registers(&old);
        ctx.begin_tick(3, 0);
        assert_eq!(new.tick(&mut ctx).unwrap(), 4.0);
    }

    #[test]
    fn test_unknown_node_is_an_error() {
        let mut b = GraphBuilder::with_seed(1);
        let root = b.constant(1.0);
        let mut graph = b.finish(root).unwrap();
        let mut ctx = ctx();
        ctx.begin_tick(0, 0);
        assert_eq!(
            graph.eval(NodeId(99), &mut ctx),
            Err(EvalError::UnknownNode(99))
        );
    }
}
