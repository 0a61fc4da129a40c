use crate::dsp::distortion::{hard_saturate, soft_saturate, wavefold, MAX_FOLDS};
use crate::error::EvalError;
use crate::graph::builder::{GraphBuilder, Operand};
use crate::graph::context::Context;
use crate::graph::node::{Node, NodeId};
use crate::graph::Graph;

/*
Saturation & Wavefolding Nodes
==============================

Saturation Modes
----------------

Soft:  Rational knee above the cutoff, flattening towards (cutoff + 1) / 2.
       Best for: warming up a bus without audible clipping

Hard:  Flat limit at the cutoff.
       Best for: fuzz, lo-fi drums

Both are stateless and odd-symmetric. The cutoff is an operand, so it can be
swept:

    let warm  = b.soft_saturate(saw, 0.6);
    let sweep = b.sine(0.2);
    let fuzz  = b.hard_saturate(saw, sweep);

Wavefolder
----------

    fold(input, folds, gain, base)

`folds` is truncated to an integer every tick and scales the input with its
sign. A negative count reflects zero times; a non-finite count or one above
`MAX_FOLDS` is an evaluation error.
*/

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaturationKind {
    Soft,
    Hard,
}

#[derive(Debug, Clone)]
pub struct SaturateNode {
    pub(crate) kind: SaturationKind,
    pub(crate) input: NodeId,
    pub(crate) cutoff: NodeId,
}

impl SaturateNode {
    pub(crate) fn compute(&mut self, graph: &mut Graph, ctx: &mut Context) -> Result<f64, EvalError> {
        let input = graph.eval(self.input, ctx)?;
        let cutoff = graph.eval(self.cutoff, ctx)?;
        Ok(match self.kind {
            SaturationKind::Soft => soft_saturate(input, cutoff),
            SaturationKind::Hard => hard_saturate(input, cutoff),
        })
    }
}

#[derive(Debug, Clone)]
pub struct WavefoldNode {
    pub(crate) input: NodeId,
    pub(crate) folds: NodeId,
    pub(crate) gain: NodeId,
    pub(crate) base: NodeId,
}

impl WavefoldNode {
    pub(crate) fn compute(&mut self, graph: &mut Graph, ctx: &mut Context) -> Result<f64, EvalError> {
        let folds = graph.eval(self.folds, ctx)?.trunc();
        if !folds.is_finite() || folds > MAX_FOLDS as f64 {
            return Err(EvalError::InvalidFolds(folds));
        }
        let folds = folds as i64;
        let base = graph.eval(self.base, ctx)?;
        let input = graph.eval(self.input, ctx)?;
        let gain = graph.eval(self.gain, ctx)?;
        Ok(wavefold(input, folds, gain, base))
    }
}

impl GraphBuilder {
    pub fn saturate(
        &mut self,
        kind: SaturationKind,
        input: impl Into<Operand>,
        cutoff: impl Into<Operand>,
    ) -> NodeId {
        let input = self.input(input);
        let cutoff = self.input(cutoff);
        self.push(Node::Saturate(SaturateNode {
            kind,
            input,
            cutoff,
        }))
    }

    pub fn soft_saturate(&mut self, input: impl Into<Operand>, cutoff: impl Into<Operand>) -> NodeId {
        self.saturate(SaturationKind::Soft, input, cutoff)
    }

    pub fn hard_saturate(&mut self, input: impl Into<Operand>, cutoff: impl Into<Operand>) -> NodeId {
        self.saturate(SaturationKind::Hard, input, cutoff)
    }

    pub fn wavefold(
        &mut self,
        input: impl Into<Operand>,
        folds: impl Into<Operand>,
        gain: impl Into<Operand>,
        base: impl Into<Operand>,
    ) -> NodeId {
        let input = self.input(input);
        let folds = self.input(folds);
        let gain = self.input(gain);
        let base = self.input(base);
        self.push(Node::Wavefold(WavefoldNode {
            input,
            folds,
            gain,
            base,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_once(graph: &mut Graph) -> Result<f64, EvalError> {
        let mut ctx = Context::new(44_100.0, 1);
        ctx.begin_tick(0, 0);
        graph.tick(&mut ctx)
    }

    #[test]
    fn test_saturation_nodes_are_odd_symmetric() {
        for kind in [SaturationKind::Soft, SaturationKind::Hard] {
            let mut b = GraphBuilder::with_seed(0);
            let pos = b.saturate(kind, 0.8, 0.5);
            let neg = b.saturate(kind, -0.8, 0.5);
            let root = b.add(pos, neg);
            let mut graph = b.finish(root).unwrap();
            assert_eq!(eval_once(&mut graph).unwrap(), 0.0, "{:?}", kind);
        }
    }

    #[test]
    fn test_hard_saturation_limits_at_cutoff() {
        let mut b = GraphBuilder::with_seed(0);
        let root = b.hard_saturate(3.0, 0.25);
        let mut graph = b.finish(root).unwrap();
        assert_eq!(eval_once(&mut graph).unwrap(), 0.25);
    }

    #[test]
    fn test_wavefold_reflects_into_range() {
        // (0.6 - 0) * 1 * 2 = 1.2 -> 0.8 -> 0.8
        let mut b = GraphBuilder::with_seed(0);
        let root = b.wavefold(0.6, 2.0, 1.0, 0.0);
        let mut graph = b.finish(root).unwrap();
        assert!((eval_once(&mut graph).unwrap() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_negative_folds_scale_but_do_not_reflect() {
        // (0.6 - 0.25) * 1 * -3 = -1.05, then + 0.25
        let mut b = GraphBuilder::with_seed(0);
        let root = b.wavefold(0.6, -3.0, 1.0, 0.25);
        let mut graph = b.finish(root).unwrap();
        assert!((eval_once(&mut graph).unwrap() + 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_unbounded_folds_are_an_error() {
        let mut b = GraphBuilder::with_seed(0);
        let root = b.wavefold(0.6, f64::INFINITY, 1.0, 0.0);
        let mut graph = b.finish(root).unwrap();
        assert_eq!(
            eval_once(&mut graph),
            Err(EvalError::InvalidFolds(f64::INFINITY))
        );

        let mut b = GraphBuilder::with_seed(0);
        let root = b.wavefold(0.6, (MAX_FOLDS + 1) as f64, 1.0, 0.0);
        let mut graph = b.finish(root).unwrap();
        assert!(eval_once(&mut graph).is_err());
    }
}
