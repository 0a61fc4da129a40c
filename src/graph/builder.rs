use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::BuildError;
use crate::graph::node::{BinaryOp, Node, NodeId, UnaryOp};
use crate::graph::Graph;

/*
Graph Construction
==================

Graphs are built bottom-up: every builder method appends one node (or a
small composite) and returns its `NodeId`, so operands always exist before
the nodes that use them and the arena stays in topological order.

Operands
--------
Builder methods take `impl Into<Operand>`. The three conversions are the
only coercions the engine performs:

  NodeId    used as is
  f64/i32   wrapped by `constant(x)`
  &str      wrapped by `reference(name)`, a symbol load

    let freq = b.mul("CC1", 10.0);   // load("CC1") * constant(10)
    let osc  = b.sine(freq);

Feedback
--------
A cycle is built in two steps:

    let (previous, close) = b.feedback_slot();
    let decay = b.mul(previous, 0.5);             // read side, usable now
    let next  = b.add(input, decay);
    let out   = close.resolve(&mut b, next);      // write side

`previous` reads the value written one tick earlier; the resolver is
consumed when the loop is closed. Every slot must be closed before
`finish`.

Validation
----------
Methods never fail in place. Argument problems are recorded and reported
by `finish`, together with structural checks (operands from another graph,
unresolved slots, sync sources that are not oscillators). A graph that
comes out of `finish` is safe to publish.
*/

/// A node operand before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Node(NodeId),
    Const(f64),
    Symbol(String),
}

impl From<NodeId> for Operand {
    fn from(id: NodeId) -> Self {
        Operand::Node(id)
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Const(value)
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::Const(value as f64)
    }
}

impl From<&str> for Operand {
    fn from(name: &str) -> Self {
        Operand::Symbol(name.to_owned())
    }
}

impl From<String> for Operand {
    fn from(name: String) -> Self {
        Operand::Symbol(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Open,
    Closed,
}

/// Closes a feedback slot opened by [`GraphBuilder::feedback_slot`].
#[derive(Debug)]
#[must_use = "a feedback slot must be closed with `resolve`"]
pub struct FeedbackResolver {
    slot: u32,
}

impl FeedbackResolver {
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Write `value` into the slot every tick it is evaluated; returns the
    /// writing node, which evaluates to `value`.
    pub fn resolve(self, builder: &mut GraphBuilder, value: impl Into<Operand>) -> NodeId {
        builder.close_feedback(self.slot, value)
    }
}

#[derive(Debug)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    slots: Vec<SlotState>,
    errors: Vec<BuildError>,
    rng: StdRng,
}

impl GraphBuilder {
    /// Builder whose random nodes are seeded from the OS.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// Builder whose random nodes are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            nodes: Vec::new(),
            slots: Vec::new(),
            errors: Vec::new(),
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Coerce an operand into a node of this graph.
    pub fn input(&mut self, operand: impl Into<Operand>) -> NodeId {
        match operand.into() {
            Operand::Node(id) => id,
            Operand::Const(value) => self.constant(value),
            Operand::Symbol(name) => self.reference(&name),
        }
    }

    pub(crate) fn inputs<I, O>(&mut self, operands: I) -> Vec<NodeId>
    where
        I: IntoIterator<Item = O>,
        O: Into<Operand>,
    {
        operands.into_iter().map(|op| self.input(op)).collect()
    }

    /// Record a construction error; `finish` reports the first one.
    pub(crate) fn reject(&mut self, error: BuildError) {
        self.errors.push(error);
    }

    /// Independent RNG for a node, derived from the builder's seed.
    pub(crate) fn fork_rng(&mut self) -> StdRng {
        fork(&mut self.rng)
    }

    /// Nested builder for a sub-graph, seeded from this one.
    pub fn child(&mut self) -> GraphBuilder {
        GraphBuilder::with_seed(self.rng.random())
    }

    pub fn constant(&mut self, value: f64) -> NodeId {
        self.push(Node::Const(value))
    }

    /// Load a named symbol from the context (0 when unset).
    pub fn reference(&mut self, name: &str) -> NodeId {
        self.push(Node::Load(name.to_owned()))
    }

    /// Store `value` under `name` and pass it through.
    pub fn store(&mut self, name: &str, value: impl Into<Operand>) -> NodeId {
        let value = self.input(value);
        self.push(Node::Store {
            name: name.to_owned(),
            value,
        })
    }

    pub fn binary(
        &mut self,
        op: BinaryOp,
        lhs: impl Into<Operand>,
        rhs: impl Into<Operand>,
    ) -> NodeId {
        let lhs = self.input(lhs);
        let rhs = self.input(rhs);
        self.push(Node::Binary { op, lhs, rhs })
    }

    pub fn add(&mut self, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> NodeId {
        self.binary(BinaryOp::Add, lhs, rhs)
    }

    pub fn sub(&mut self, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> NodeId {
        self.binary(BinaryOp::Sub, lhs, rhs)
    }

    pub fn mul(&mut self, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> NodeId {
        self.binary(BinaryOp::Mul, lhs, rhs)
    }

    pub fn div(&mut self, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> NodeId {
        self.binary(BinaryOp::Div, lhs, rhs)
    }

    /// Floored modulo.
    pub fn rem(&mut self, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> NodeId {
        self.binary(BinaryOp::Rem, lhs, rhs)
    }

    pub fn unary(&mut self, op: UnaryOp, input: impl Into<Operand>) -> NodeId {
        let input = self.input(input);
        self.push(Node::Unary { op, input })
    }

    pub fn neg(&mut self, input: impl Into<Operand>) -> NodeId {
        self.unary(UnaryOp::Neg, input)
    }

    pub fn int(&mut self, input: impl Into<Operand>) -> NodeId {
        self.unary(UnaryOp::Int, input)
    }

    pub fn boolean(&mut self, input: impl Into<Operand>) -> NodeId {
        self.unary(UnaryOp::Bool, input)
    }

    /// `dry·(1 - ratio) + wet·ratio`
    pub fn interpolate(
        &mut self,
        dry: impl Into<Operand>,
        wet: impl Into<Operand>,
        ratio: impl Into<Operand>,
    ) -> NodeId {
        let dry = self.input(dry);
        let wet = self.input(wet);
        let ratio = self.input(ratio);
        self.push(Node::Interpolate { dry, wet, ratio })
    }

    /// Sum of all inputs; an empty mix is silence.
    pub fn mix<I, O>(&mut self, inputs: I) -> NodeId
    where
        I: IntoIterator<Item = O>,
        O: Into<Operand>,
    {
        let inputs = self.inputs(inputs);
        self.push(Node::Mix(inputs))
    }

    /// Open a feedback slot. The returned node reads the slot's value from
    /// the previous tick (0 before the first write).
    pub fn feedback_slot(&mut self) -> (NodeId, FeedbackResolver) {
        let slot = self.slots.len() as u32;
        self.slots.push(SlotState::Open);
        let read = self.push(Node::FeedbackRead { slot });
        (read, FeedbackResolver { slot })
    }

    /// Close slot `slot` with `value`. Prefer [`FeedbackResolver::resolve`];
    /// this entry point exists for front-ends that cannot hold the resolver.
    pub fn close_feedback(&mut self, slot: u32, value: impl Into<Operand>) -> NodeId {
        let value = self.input(value);
        match self.slots.get_mut(slot as usize) {
            Some(state @ SlotState::Open) => *state = SlotState::Closed,
            Some(SlotState::Closed) => self.reject(BuildError::FeedbackClosedTwice(slot)),
            None => self.reject(BuildError::invalid(
                "feedback",
                format!("slot {} was not opened by this builder", slot),
            )),
        }
        self.push(Node::FeedbackWrite { slot, value })
    }

    /// Validate and freeze the graph with `root` as its output.
    pub fn finish(mut self, root: NodeId) -> Result<Graph, BuildError> {
        if !self.errors.is_empty() {
            return Err(self.errors.swap_remove(0));
        }
        if root.index() >= self.nodes.len() {
            return Err(BuildError::invalid(
                "graph",
                format!("root {} is not a node of this graph", root),
            ));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            for operand in node.operands() {
                if operand.index() >= index {
                    return Err(BuildError::DanglingOperand {
                        node: index as u32,
                        operand: operand.0,
                    });
                }
            }
            if let Node::Oscillator(osc) = node {
                if let Some(source) = osc.sync {
                    if !matches!(self.nodes[source.index()], Node::Oscillator(_)) {
                        return Err(BuildError::InvalidSync(source.0));
                    }
                }
            }
        }

        if let Some(open) = self.slots.iter().position(|s| *s == SlotState::Open) {
            return Err(BuildError::UnresolvedFeedback(open as u32));
        }

        Ok(Graph::from_parts(self.nodes, self.slots.len(), root))
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A new generator seeded from `rng`.
pub(crate) fn fork(rng: &mut StdRng) -> StdRng {
    StdRng::seed_from_u64(rng.random())
}
