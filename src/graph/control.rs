use rand::rngs::StdRng;
use rand::Rng;

use crate::error::{BuildError, EvalError};
use crate::graph::builder::{GraphBuilder, Operand};
use crate::graph::context::{Context, SAMPLE, SAMPLE_RATE};
use crate::graph::node::{Node, NodeId, Watch};
use crate::graph::Graph;
use crate::sequencing::RhythmPattern;

/*
Control & Sequencing Nodes
==========================

Sequencing is built from a beat clock and edge detection rather than a
scheduler:

    beat(bpm)          sample · bpm / (sample_rate · 60), a real number
    trigger(beat)      1 on ticks where floor(beat) changed, else 0
    switcher(i, [..])  evaluates only branch floor(i) mod len

A four-step bass line that changes note on every beat:

    let beat = b.beat(120.0);
    let note = b.switcher(beat, vec![36.0, 36.0, 43.0, 41.0]);

Nodes driven by a trigger
-------------------------
  sample_hold    holds `signal` as sampled on the last trigger
  glissando      starts at `target`, moves one |step| towards it per trigger
                 (stops within step/2 so it cannot oscillate around it)
  random_walk    starts at floor((min+max)/2), adds uniform(-spread, spread)
                 per trigger, clamped to [min, max]

Because a switcher only evaluates the selected branch, nodes in the other
branches keep their state frozen until they are selected again.
*/

/// Beat position at the context's current sample.
#[inline]
pub(crate) fn beat_at(ctx: &Context, bpm: f64) -> f64 {
    ctx.load(SAMPLE) * bpm / (ctx.load(SAMPLE_RATE) * 60.0)
}

#[inline]
fn fired(value: f64) -> bool {
    value != 0.0
}

#[derive(Debug, Clone)]
pub struct TriggerNode {
    pub(crate) beat: NodeId,
    watch: Watch,
}

impl TriggerNode {
    pub(crate) fn compute(&mut self, graph: &mut Graph, ctx: &mut Context) -> Result<f64, EvalError> {
        let beat = graph.eval(self.beat, ctx)?.floor();
        Ok(if self.watch.observe(beat) { 1.0 } else { 0.0 })
    }
}

#[derive(Debug, Clone)]
pub struct RhythmNode {
    pub(crate) beat: NodeId,
    pattern: RhythmPattern,
}

impl RhythmNode {
    pub(crate) fn compute(&mut self, graph: &mut Graph, ctx: &mut Context) -> Result<f64, EvalError> {
        let beat = graph.eval(self.beat, ctx)?.floor();
        Ok(self.pattern.position(beat as i64))
    }
}

#[derive(Debug, Clone)]
pub struct SampleHoldNode {
    pub(crate) trigger: NodeId,
    pub(crate) signal: NodeId,
    held: f64,
}

impl SampleHoldNode {
    pub(crate) fn compute(&mut self, graph: &mut Graph, ctx: &mut Context) -> Result<f64, EvalError> {
        if fired(graph.eval(self.trigger, ctx)?) {
            self.held = graph.eval(self.signal, ctx)?;
        }
        Ok(self.held)
    }
}

#[derive(Debug, Clone)]
pub struct GlissandoNode {
    pub(crate) target: NodeId,
    pub(crate) step: NodeId,
    pub(crate) trigger: NodeId,
    value: Option<f64>,
}

impl GlissandoNode {
    pub(crate) fn compute(&mut self, graph: &mut Graph, ctx: &mut Context) -> Result<f64, EvalError> {
        // The target is only pulled to start the glide and on triggers.
        let mut value = match self.value {
            Some(value) => value,
            None => graph.eval(self.target, ctx)?,
        };

        if fired(graph.eval(self.trigger, ctx)?) {
            let step = graph.eval(self.step, ctx)?.abs();
            let target = graph.eval(self.target, ctx)?;
            if (value - target).abs() > step / 2.0 {
                value += if value < target { step } else { -step };
            }
        }

        self.value = Some(value);
        Ok(value)
    }
}

#[derive(Debug, Clone)]
pub struct RandomWalkNode {
    pub(crate) trigger: NodeId,
    min: f64,
    max: f64,
    spread: f64,
    position: f64,
    rng: StdRng,
}

impl RandomWalkNode {
    pub(crate) fn compute(&mut self, graph: &mut Graph, ctx: &mut Context) -> Result<f64, EvalError> {
        if fired(graph.eval(self.trigger, ctx)?) {
            let step = self.rng.random_range(-self.spread..=self.spread);
            self.position = (self.position + step).clamp(self.min, self.max);
        }
        Ok(self.position)
    }

    pub(crate) fn reseed(&mut self, rng: StdRng) {
        self.rng = rng;
    }
}

impl GraphBuilder {
    /// Beats elapsed at the current sample for a tempo of `bpm`.
    pub fn beat(&mut self, bpm: impl Into<Operand>) -> NodeId {
        let bpm = self.input(bpm);
        self.push(Node::Beat { bpm })
    }

    /// 1 whenever `floor(beat)` differs from the previous evaluation,
    /// including the first one.
    pub fn trigger(&mut self, beat: impl Into<Operand>) -> NodeId {
        let beat = self.input(beat);
        self.push(Node::Trigger(TriggerNode {
            beat,
            watch: Watch::default(),
        }))
    }

    /// Evaluate only `branches[floor(index) mod len]`.
    pub fn switcher<I, O>(&mut self, index: impl Into<Operand>, branches: I) -> NodeId
    where
        I: IntoIterator<Item = O>,
        O: Into<Operand>,
    {
        let index = self.input(index);
        let branches = self.inputs(branches);
        if branches.is_empty() {
            self.reject(BuildError::invalid("switcher", "needs at least one branch"));
            return self.constant(0.0);
        }
        self.push(Node::Switcher { index, branches })
    }

    pub fn rhythm(&mut self, pattern: RhythmPattern, beat: impl Into<Operand>) -> NodeId {
        let beat = self.input(beat);
        self.push(Node::Rhythm(RhythmNode { beat, pattern }))
    }

    pub fn sample_hold(&mut self, trigger: impl Into<Operand>, signal: impl Into<Operand>) -> NodeId {
        let trigger = self.input(trigger);
        let signal = self.input(signal);
        self.push(Node::SampleHold(SampleHoldNode {
            trigger,
            signal,
            held: 0.0,
        }))
    }

    pub fn glissando(
        &mut self,
        target: impl Into<Operand>,
        step: impl Into<Operand>,
        trigger: impl Into<Operand>,
    ) -> NodeId {
        let target = self.input(target);
        let step = self.input(step);
        let trigger = self.input(trigger);
        self.push(Node::Glissando(GlissandoNode {
            target,
            step,
            trigger,
            value: None,
        }))
    }

    /// Bounded random walk. `min`, `max` and `spread` are fixed at build
    /// time; `min <= max` and `spread >= 0` are required.
    pub fn random_walk(
        &mut self,
        min: f64,
        max: f64,
        spread: f64,
        trigger: impl Into<Operand>,
    ) -> NodeId {
        let trigger = self.input(trigger);
        if !(min.is_finite() && max.is_finite() && spread.is_finite()) {
            self.reject(BuildError::invalid("random_walk", "bounds and spread must be finite"));
            return self.constant(0.0);
        }
        if min > max {
            self.reject(BuildError::invalid(
                "random_walk",
                format!("min {} is above max {}", min, max),
            ));
            return self.constant(0.0);
        }
        if spread < 0.0 {
            self.reject(BuildError::invalid(
                "random_walk",
                format!("spread {} is negative", spread),
            ));
            return self.constant(0.0);
        }

        let rng = self.fork_rng();
        self.push(Node::RandomWalk(RandomWalkNode {
            trigger,
            min,
            max,
            spread,
            position: ((min + max) / 2.0).floor(),
            rng,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_at(graph: &mut Graph, sample_rate: f64, samples: &[u64]) -> Vec<f64> {
        let mut ctx = Context::new(sample_rate, 1);
        samples
            .iter()
            .map(|&sample| {
                ctx.begin_tick(sample, 0);
                graph.tick(&mut ctx).unwrap()
            })
            .collect()
    }

    fn render(graph: &mut Graph, frames: u64) -> Vec<f64> {
        let samples: Vec<u64> = (0..frames).collect();
        render_at(graph, 1_000.0, &samples)
    }

    /// Symbol-driven beat so tests can script the exact sequence.
    fn scripted(values: &[f64], graph: &mut Graph) -> Vec<f64> {
        let mut ctx = Context::new(1_000.0, 1);
        values
            .iter()
            .enumerate()
            .map(|(sample, &value)| {
                ctx.store("in", value);
                ctx.begin_tick(sample as u64, 0);
                graph.tick(&mut ctx).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_beat_counts_from_sample_index() {
        for (bpm, expected) in [(60.0, 0.5), (120.0, 1.0)] {
            let mut b = GraphBuilder::with_seed(0);
            let beat = b.beat(bpm);
            let mut graph = b.finish(beat).unwrap();
            let out = render_at(&mut graph, 44_100.0, &[0, 22_050]);
            assert_eq!(out[0], 0.0);
            assert!((out[1] - expected).abs() < 1e-9, "beat({}) was {}", bpm, out[1]);
        }
    }

    #[test]
    fn test_trigger_fires_on_floor_changes_and_first_tick() {
        let mut b = GraphBuilder::with_seed(0);
        let input = b.reference("in");
        let trigger = b.trigger(input);
        let mut graph = b.finish(trigger).unwrap();
        let out = scripted(&[0.2, 0.7, 1.1, 1.9, 2.0, 2.5, 1.0], &mut graph);
        assert_eq!(out, vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_switcher_wraps_and_skips_other_branches() {
        let mut b = GraphBuilder::with_seed(0);
        let input = b.reference("in");
        let root = b.switcher(input, vec![10.0, 20.0, 30.0]);
        let mut graph = b.finish(root).unwrap();
        let out = scripted(&[0.0, 2.5, 3.0, 4.0, 5.9, -1.0], &mut graph);
        assert_eq!(out, vec![10.0, 30.0, 10.0, 20.0, 30.0, 30.0]);
    }

    #[test]
    fn test_empty_switcher_is_rejected() {
        let mut b = GraphBuilder::with_seed(0);
        let root = b.switcher(0.0, Vec::<f64>::new());
        assert!(matches!(b.finish(root), Err(BuildError::InvalidArgument { .. })));
    }

    #[test]
    fn test_rhythm_maps_beats_onto_pattern() {
        let mut b = GraphBuilder::with_seed(0);
        let input = b.reference("in");
        let pattern = RhythmPattern::new(&[1.0, 2.0, 1.0]).unwrap();
        let root = b.rhythm(pattern, input);
        let mut graph = b.finish(root).unwrap();
        let out = scripted(&[0.0, 1.0, 2.0, 3.0, 4.5, 5.0], &mut graph);
        assert_eq!(out, vec![0.0, 2.0, 3.0, 3.0, 5.0, 6.0]);
    }

    #[test]
    fn test_sample_hold_updates_only_on_trigger() {
        let mut b = GraphBuilder::with_seed(0);
        let gate = b.reference("in");
        let signal = b.reference(SAMPLE);
        let root = b.sample_hold(gate, signal);
        let mut graph = b.finish(root).unwrap();
        let out = scripted(&[1.0, 0.0, 0.0, 1.0, 0.0], &mut graph);
        assert_eq!(out, vec![0.0, 0.0, 0.0, 3.0, 3.0]);
    }

    #[test]
    fn test_glissando_steps_towards_target_and_settles() {
        let mut b = GraphBuilder::with_seed(0);
        let target = b.reference("in");
        let root = b.glissando(target, -1.0, 1.0);
        let mut graph = b.finish(root).unwrap();
        // Starts at the first target, then chases 3.4 one unit per tick.
        let out = scripted(&[0.0, 3.4, 3.4, 3.4, 3.4, 3.4], &mut graph);
        assert_eq!(out, vec![0.0, 1.0, 2.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_glissando_leaves_target_idle_between_triggers() {
        let mut b = GraphBuilder::with_seed(0);
        // 100 Hz at 1 kHz: each evaluation advances the phase by 0.1.
        let target = b.saw_up(100.0);
        let trigger = b.reference("in");
        let root = b.glissando(target, 1.0, trigger);
        let mut graph = b.finish(root).unwrap();
        scripted(&[0.0, 0.0, 0.0, 1.0, 0.0], &mut graph);
        // Pulled on the first tick and on the trigger only.
        let phase = graph.oscillator_phase(target).unwrap();
        assert!((phase - 0.2).abs() < 1e-9, "phase {}", phase);
    }

    #[test]
    fn test_random_walk_stays_in_bounds() {
        let mut b = GraphBuilder::with_seed(3);
        let root = b.random_walk(-2.0, 5.0, 1.5, 1.0);
        let mut graph = b.finish(root).unwrap();
        let out = render(&mut graph, 5_000);
        assert!(out.iter().all(|v| (-2.0..=5.0).contains(v)));
        assert!(out.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_random_walk_starts_at_floored_midpoint() {
        let mut b = GraphBuilder::with_seed(3);
        let root = b.random_walk(0.0, 5.0, 1.0, 0.0);
        let mut graph = b.finish(root).unwrap();
        assert_eq!(render(&mut graph, 3), vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_random_walk_rejects_bad_bounds() {
        let mut b = GraphBuilder::with_seed(3);
        let root = b.random_walk(5.0, 0.0, 1.0, 1.0);
        assert!(b.finish(root).is_err());

        let mut b = GraphBuilder::with_seed(3);
        let root = b.random_walk(0.0, 5.0, -1.0, 1.0);
        assert!(b.finish(root).is_err());
    }
}
