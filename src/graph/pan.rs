use std::f64::consts::TAU;

use crate::dsp::{HistoryBuffer, MAX_HISTORY_LAG};
use crate::error::EvalError;
use crate::graph::builder::{GraphBuilder, Operand};
use crate::graph::context::Context;
use crate::graph::node::{Node, NodeId};
use crate::graph::Graph;

/*
Stereo Placement
================

Both nodes read the channel being rendered and produce that channel's share
of the signal. Channel 0 is the left ear; every other channel is treated as
the right one.

Pan
---
Linear, constant-sum:

    gain_left  = 2 · (position + 1) / 2
    gain_right = 2 · (1 - (position + 1) / 2)

position +1 sends everything to channel 0, -1 everything to channel 1, and
the centre (0) leaves both channels at unity gain.

Pan 2D
------
A rough binaural model. The source sits at (x, y) in a plane where the
listener's head is at the origin and the ears are 0.1 units to either side.
Each channel hears the source:

  - delayed by its distance to that ear, at an arbitrary speed of sound of
    50 units per second:   delay = trunc(hypot(x', y) · sample_rate / 50)
  - attenuated by the angle around the head:
                           gain  = 1 - |atan2(y, x')| / 2π

where x' = x - 0.1 on channel 0 and -x - 0.1 on the others. The delay is
read from the node's own history of its input.
*/

#[derive(Debug, Clone)]
pub struct PanNode {
    pub(crate) input: NodeId,
    pub(crate) position: NodeId,
}

impl PanNode {
    pub(crate) fn compute(&mut self, graph: &mut Graph, ctx: &mut Context) -> Result<f64, EvalError> {
        let input = graph.eval(self.input, ctx)?;
        let mut share = (graph.eval(self.position, ctx)? + 1.0) / 2.0;
        if ctx.channel() != 0 {
            share = 1.0 - share;
        }
        Ok(2.0 * input * share)
    }
}

#[derive(Debug, Clone)]
pub struct Pan2dNode {
    pub(crate) input: NodeId,
    pub(crate) x: NodeId,
    pub(crate) y: NodeId,
    history: HistoryBuffer,
    last_push: Option<u64>,
}

impl Pan2dNode {
    pub(crate) fn compute(&mut self, graph: &mut Graph, ctx: &mut Context) -> Result<f64, EvalError> {
        if self.last_push != Some(ctx.sample()) {
            let input = graph.eval(self.input, ctx)?;
            self.history.push(input);
            self.last_push = Some(ctx.sample());
        }

        let mut x = graph.eval(self.x, ctx)?;
        let y = graph.eval(self.y, ctx)?;
        if ctx.channel() != 0 {
            x = -x;
        }
        x -= 0.1;

        let delay = (x.hypot(y) * ctx.sample_rate() / 50.0).trunc();
        if !delay.is_finite() || delay > MAX_HISTORY_LAG as f64 {
            return Err(EvalError::InvalidLag(delay));
        }
        let gain = 1.0 - (y.atan2(x).abs() / TAU).max(0.0);
        Ok(gain * self.history.get(delay as usize))
    }
}

impl GraphBuilder {
    /// Linear pan; `position` runs from -1 to 1.
    pub fn pan(&mut self, input: impl Into<Operand>, position: impl Into<Operand>) -> NodeId {
        let input = self.input(input);
        let position = self.input(position);
        self.push(Node::Pan(PanNode { input, position }))
    }

    /// Place `input` at (x, y) around the listener.
    pub fn pan2d(
        &mut self,
        input: impl Into<Operand>,
        x: impl Into<Operand>,
        y: impl Into<Operand>,
    ) -> NodeId {
        let input = self.input(input);
        let x = self.input(x);
        let y = self.input(y);
        self.push(Node::Pan2d(Pan2dNode {
            input,
            x,
            y,
            history: HistoryBuffer::new(),
            last_push: None,
        }))
    }
}
