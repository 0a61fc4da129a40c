use crate::dsp::{HistoryBuffer, MAX_HISTORY_LAG};
use crate::error::EvalError;
use crate::graph::builder::{GraphBuilder, Operand};
use crate::graph::context::{Context, SAMPLE_RATE};
use crate::graph::node::{Node, NodeId};
use crate::graph::Graph;

/*
History & Delay
===============

A history node records its input once per frame and answers with the value
recorded `round(lag)` frames ago:

    lag 0  →  this frame's input
    lag n  →  the input n frames back (0 before anything was recorded)

The buffer grows on demand, so a lag may be swept upwards freely. A lag that
is negative, non-finite or above `MAX_HISTORY_LAG` is an evaluation error.

Delay line
----------
`delay` is a composite built from a history node and one feedback slot. The
slot holds the delayed output, which is fed back into the recorded signal:

                ┌────────── × feedback ◄─────────┐
                ▼                                │
    input ──► (+) ──► history(time·sample_rate) ─┴──► delayed
      │                                                 │
      └────────────────► interpolate(drywet) ◄──────────┘

With feedback 0 and drywet 1 the output is the input shifted by
`round(time · sample_rate)` frames.
*/

#[derive(Debug, Clone)]
pub struct HistoryNode {
    pub(crate) input: NodeId,
    pub(crate) lag: NodeId,
    history: HistoryBuffer,
    last_push: Option<u64>,
}

impl HistoryNode {
    pub(crate) fn compute(&mut self, graph: &mut Graph, ctx: &mut Context) -> Result<f64, EvalError> {
        if self.last_push != Some(ctx.sample()) {
            let input = graph.eval(self.input, ctx)?;
            self.history.push(input);
            self.last_push = Some(ctx.sample());
        }

        let lag = graph.eval(self.lag, ctx)?.round();
        if !lag.is_finite() || lag < 0.0 || lag > MAX_HISTORY_LAG as f64 {
            return Err(EvalError::InvalidLag(lag));
        }
        Ok(self.history.get(lag as usize))
    }
}

impl GraphBuilder {
    /// Value of `input` recorded `lag` frames ago.
    pub fn history(&mut self, input: impl Into<Operand>, lag: impl Into<Operand>) -> NodeId {
        let input = self.input(input);
        let lag = self.input(lag);
        self.push(Node::History(HistoryNode {
            input,
            lag,
            history: HistoryBuffer::new(),
            last_push: None,
        }))
    }

    /// Feedback delay line; `time` is in seconds.
    pub fn delay(
        &mut self,
        input: impl Into<Operand>,
        time: impl Into<Operand>,
        drywet: impl Into<Operand>,
        feedback: impl Into<Operand>,
    ) -> NodeId {
        let input = self.input(input);
        let (previous, close) = self.feedback_slot();
        let returned = self.mul(feedback, previous);
        let recorded = self.add(input, returned);

        let sample_rate = self.reference(SAMPLE_RATE);
        let lag = self.mul(time, sample_rate);
        let delayed = self.history(recorded, lag);
        let delayed = close.resolve(self, delayed);

        self.interpolate(input, delayed, drywet)
    }
}
