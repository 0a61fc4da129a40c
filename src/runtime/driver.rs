use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::Receiver;
use log::{error, info, warn};

use crate::error::{EngineError, EvalError};
use crate::graph::{Context, Graph};
use crate::io::converter::encode_sample;
use crate::io::sink::PcmSink;
use crate::synth::MidiBus;

/*
Render Driver
=============

The driver owns everything the render thread touches: the context, the
active patch and the fallback. One frame is:

  1. adopt the newest published patch, if any (older ones are dropped)
  2. load the latest MIDI snapshot; copy controllers into CC<n> symbols
     when their revision moved
  3. tick every lane's graph once, channel by channel
  4. on an evaluation error, roll back to the fallback and render the frame
     again; without a fallback the error ends the session

A swap keeps the replaced patch as the fallback and carries its feedback
registers over, so a reload that only retunes a feedback loop does not empty
it. A rollback clears the fallback: a second failure is fatal.
*/

/// One graph copy per output channel ("lane").
#[derive(Debug, Clone)]
pub struct Patch {
    lanes: Vec<Graph>,
}

impl Patch {
    pub fn new(graph: Graph, channels: usize) -> Self {
        let channels = channels.max(1);
        let mut lanes = Vec::with_capacity(channels);
        lanes.resize(channels - 1, graph.clone());
        lanes.push(graph);
        Self { lanes }
    }

    pub fn lanes(&self) -> usize {
        self.lanes.len()
    }

    pub fn lane(&self, channel: usize) -> Option<&Graph> {
        self.lanes.get(channel)
    }

    fn adopt_registers(&mut self, previous: &Patch) {
        for (lane, old) in self.lanes.iter_mut().zip(&previous.lanes) {
            lane.adopt_registers(old);
        }
    }

    fn render(&mut self, ctx: &mut Context, sample: u64, frame: &mut [f64]) -> Result<(), EvalError> {
        for (channel, (lane, out)) in self.lanes.iter_mut().zip(frame.iter_mut()).enumerate() {
            ctx.begin_tick(sample, channel);
            *out = lane.tick(ctx)?;
        }
        Ok(())
    }
}

/// Outcome of [`Driver::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub interrupted: bool,
}

pub struct Driver {
    ctx: Context,
    active: Patch,
    fallback: Option<Patch>,
    inbox: Receiver<Patch>,
    midi: Option<MidiBus>,
    control_revision: u64,
    sample: u64,
    frame: Vec<f64>,
}

impl Driver {
    pub fn new(sample_rate: f64, channels: usize, initial: Graph, inbox: Receiver<Patch>) -> Self {
        let ctx = Context::new(sample_rate, channels);
        let channels = ctx.channels();
        Self {
            ctx,
            active: Patch::new(initial, channels),
            fallback: None,
            inbox,
            midi: None,
            control_revision: 0,
            sample: 0,
            frame: vec![0.0; channels],
        }
    }

    pub fn with_midi(mut self, bus: MidiBus) -> Self {
        self.midi = Some(bus);
        self
    }

    pub fn channels(&self) -> usize {
        self.frame.len()
    }

    /// Index of the next frame to render.
    pub fn sample(&self) -> u64 {
        self.sample
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn active(&self) -> &Patch {
        &self.active
    }

    fn adopt_published(&mut self) {
        let Some(mut patch) = self.inbox.try_iter().last() else {
            return;
        };
        if patch.lanes() != self.active.lanes() {
            warn!(
                "published patch has {} lanes, expected {}; ignored",
                patch.lanes(),
                self.active.lanes()
            );
            return;
        }
        patch.adopt_registers(&self.active);
        let previous = std::mem::replace(&mut self.active, patch);
        self.fallback = Some(previous);
        info!("patch swapped in at frame {}", self.sample);
    }

    fn sync_midi(&mut self) {
        let Some(bus) = &self.midi else {
            return;
        };
        let snapshot = bus.snapshot();
        if snapshot.control_revision() != self.control_revision {
            for (&controller, &value) in snapshot.controls() {
                self.ctx.set_control(controller, f64::from(value));
            }
            self.control_revision = snapshot.control_revision();
        }
        self.ctx.set_midi(snapshot);
    }

    /// Render one frame, one value per channel.
    pub fn render_frame(&mut self) -> Result<&[f64], EngineError> {
        self.adopt_published();
        self.sync_midi();

        while let Err(err) = self.active.render(&mut self.ctx, self.sample, &mut self.frame) {
            match self.fallback.take() {
                Some(previous) => {
                    warn!(
                        "evaluation failed at frame {} ({}); rolling back to the previous patch",
                        self.sample, err
                    );
                    self.active = previous;
                }
                None => {
                    error!("evaluation failed at frame {} with no fallback: {}", self.sample, err);
                    return Err(EngineError::Evaluation(err));
                }
            }
        }

        self.sample += 1;
        Ok(&self.frame)
    }

    /// Render one frame and hand it to `sink` as interleaved PCM.
    pub fn write_frame<S: PcmSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), EngineError> {
        self.render_frame()?;
        for &value in &self.frame {
            sink.write_sample(encode_sample(value))?;
        }
        sink.end_frame()?;
        Ok(())
    }

    /// Render until `stop` is raised or `limit` frames were written, then
    /// finish the sink.
    pub fn run<S: PcmSink + ?Sized>(
        &mut self,
        sink: &mut S,
        stop: &AtomicBool,
        limit: Option<u64>,
    ) -> Result<RunSummary, EngineError> {
        info!(
            "rendering {} channel(s) at {} Hz",
            self.channels(),
            self.ctx.sample_rate()
        );
        let mut frames = 0;
        let mut interrupted = false;
        loop {
            if limit.is_some_and(|limit| frames >= limit) {
                break;
            }
            if stop.load(Ordering::Relaxed) {
                interrupted = true;
                break;
            }
            self.write_frame(sink)?;
            frames += 1;
        }
        sink.finish()?;
        info!("session ended after {} frames", frames);
        Ok(RunSummary {
            frames,
            interrupted,
        })
    }
}
