use std::fmt;
use std::sync::Arc;

use log::debug;
use rand::rngs::StdRng;

use crate::error::{BuildError, EvalError};
use crate::graph::builder::{GraphBuilder, Operand};
use crate::graph::context::Context;
use crate::graph::node::{Node, NodeId};
use crate::graph::Graph;

/*
Templates, Calls & Voices
=========================

A template is a finished sub-graph plus the names of its parameters. The body
reads its parameters as ordinary symbols:

    let pluck = b.template(["note"], |t| {
        let freq = t.diatonic("note");
        let tone = t.saw_up(freq);
        Ok(t.exp_envelope(tone, 1.0))
    })?;

Call
----
A call owns its own copy of the body, so every call site has independent
oscillator phases, filter memories and feedback registers. Random nodes in
the copy are reseeded, so two calls never share a noise sequence. Per tick it
evaluates its argument operands in the calling graph, stores them under the
parameter names, then ticks its body:

    let c  = b.call(&pluck, [("note", 60.0)]);
    let cm = b.chord(&pluck, &[0.0, 3.0, 7.0], 60.0);   // three calls, summed

MIDI voices
-----------
`midi_voices` sums one body copy per held note. Whenever the published MIDI
snapshot carries a new note revision the whole voice set is rebuilt from the
active notes (fresh bodies, so every voice restarts); each voice then sees
`note` and `velocity` stored before its body ticks.
*/

/// Symbol a voice's note number is stored under.
pub const NOTE: &str = "note";
/// Symbol a voice's velocity is stored under.
pub const VELOCITY: &str = "velocity";

pub struct Template {
    body: Graph,
    params: Vec<String>,
}

impl Template {
    pub fn new(body: Graph, params: Vec<String>) -> Self {
        Self { body, params }
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p == name)
    }

    /// A fresh copy of the body with its initial state and random nodes
    /// reseeded from `rng`.
    pub fn instantiate(&self, rng: &mut StdRng) -> Graph {
        let mut body = self.body.clone();
        body.reseed(rng);
        body
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("params", &self.params)
            .field("nodes", &self.body.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CallNode {
    body: Graph,
    args: Vec<(String, NodeId)>,
}

impl CallNode {
    pub(crate) fn operands(&self) -> Vec<NodeId> {
        self.args.iter().map(|(_, id)| *id).collect()
    }

    pub(crate) fn compute(&mut self, graph: &mut Graph, ctx: &mut Context) -> Result<f64, EvalError> {
        for (name, arg) in &self.args {
            let value = graph.eval(*arg, ctx)?;
            ctx.store(name, value);
        }
        self.body.tick(ctx)
    }

    pub(crate) fn reseed(&mut self, rng: &mut StdRng) {
        self.body.reseed(rng);
    }
}

#[derive(Debug, Clone)]
struct Voice {
    note: u8,
    velocity: u8,
    body: Graph,
}

#[derive(Debug, Clone)]
pub struct VoicesNode {
    template: Arc<Template>,
    voices: Vec<Voice>,
    revision: Option<u64>,
    rng: StdRng,
}

impl VoicesNode {
    pub fn active(&self) -> usize {
        self.voices.len()
    }

    pub(crate) fn reseed(&mut self, rng: StdRng) {
        self.rng = rng;
    }

    pub(crate) fn compute(&mut self, ctx: &mut Context) -> Result<f64, EvalError> {
        let snapshot = Arc::clone(ctx.midi());
        if self.revision != Some(snapshot.note_revision()) {
            self.voices = snapshot
                .notes()
                .iter()
                .map(|(&note, &velocity)| Voice {
                    note,
                    velocity,
                    body: self.template.instantiate(&mut self.rng),
                })
                .collect();
            self.revision = Some(snapshot.note_revision());
            debug!(
                "voice set rebuilt at revision {}: {} active",
                snapshot.note_revision(),
                self.voices.len()
            );
        }

        let mut sum = 0.0;
        for voice in &mut self.voices {
            ctx.store(NOTE, f64::from(voice.note));
            ctx.store(VELOCITY, f64::from(voice.velocity));
            sum += voice.body.tick(ctx)?;
        }
        Ok(sum)
    }
}

impl GraphBuilder {
    /// Build a template body with a nested builder seeded from this one.
    pub fn template<I, S, F>(&mut self, params: I, body: F) -> Result<Arc<Template>, BuildError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce(&mut GraphBuilder) -> Result<NodeId, BuildError>,
    {
        let mut nested = self.child();
        let root = body(&mut nested)?;
        let body = nested.finish(root)?;
        let params = params.into_iter().map(Into::into).collect();
        Ok(Arc::new(Template::new(body, params)))
    }

    /// Call `template` with named arguments.
    pub fn call<I, S, O>(&mut self, template: &Arc<Template>, args: I) -> NodeId
    where
        I: IntoIterator<Item = (S, O)>,
        S: Into<String>,
        O: Into<Operand>,
    {
        let mut bound = Vec::new();
        for (name, value) in args {
            let name = name.into();
            if !template.has_param(&name) {
                self.reject(BuildError::UnknownParameter(name));
                continue;
            }
            let value = self.input(value);
            bound.push((name, value));
        }
        let mut rng = self.fork_rng();
        self.push(Node::Call(CallNode {
            body: template.instantiate(&mut rng),
            args: bound,
        }))
    }

    /// Sum of one call per offset, each with `note = base + offset`.
    pub fn chord(
        &mut self,
        template: &Arc<Template>,
        offsets: &[f64],
        base: impl Into<Operand>,
    ) -> NodeId {
        let base = self.input(base);
        let calls: Vec<NodeId> = offsets
            .iter()
            .map(|&offset| {
                let note = self.add(base, offset);
                self.call(template, [(NOTE, note)])
            })
            .collect();
        self.mix(calls)
    }

    /// Sum of one instance of `template` per held MIDI note.
    pub fn midi_voices(&mut self, template: &Arc<Template>) -> NodeId {
        let rng = self.fork_rng();
        self.push(Node::Voices(VoicesNode {
            template: Arc::clone(template),
            voices: Vec::new(),
            revision: None,
            rng,
        }))
    }
}
