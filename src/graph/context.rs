use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::synth::MidiSnapshot;

/// Symbol holding the current frame index.
pub const SAMPLE: &str = "sample";
/// Symbol holding the channel being rendered (0-based).
pub const CHANNEL: &str = "channel";
/// Symbol holding the sample rate in Hz.
pub const SAMPLE_RATE: &str = "sample_rate";

/// Execution context shared by every node evaluation.
///
/// Holds:
/// - one symbol table per output channel ("lane"); symbols persist across
///   ticks until overwritten and read as 0 when unset
/// - the tick epoch: every `begin_tick` starts a new epoch, which invalidates
///   all memoized node values at once (graphs stamp their cache entries with
///   the epoch they were computed in)
/// - the current sample and channel indices, mirrored into the `sample` and
///   `channel` symbols
/// - the latest published MIDI snapshot
#[derive(Debug)]
pub struct Context {
    id: u64,
    sample_rate: f64,
    epoch: u64,
    sample: u64,
    channel: usize,
    lanes: Vec<HashMap<String, f64>>,
    midi: Arc<MidiSnapshot>,
}

impl Context {
    pub fn new(sample_rate: f64, channels: usize) -> Self {
        let channels = channels.max(1);
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        let mut ctx = Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            sample_rate,
            // Fresh graphs stamp their cache with epoch 0, so start above it.
            epoch: 1,
            sample: 0,
            channel: 0,
            lanes: vec![HashMap::new(); channels],
            midi: Arc::default(),
        };
        for lane in 0..channels {
            ctx.set_in(lane, SAMPLE_RATE, sample_rate);
            ctx.set_in(lane, CHANNEL, lane as f64);
            ctx.set_in(lane, SAMPLE, 0.0);
        }
        ctx
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.lanes.len()
    }

    #[inline]
    pub fn sample(&self) -> u64 {
        self.sample
    }

    #[inline]
    pub fn channel(&self) -> usize {
        self.channel
    }

    /// Process-unique identity; graphs use it to notice a change of context.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Start a new tick: invalidate cached values and publish the sample and
    /// channel indices. Channels beyond the configured count are clamped.
    pub fn begin_tick(&mut self, sample: u64, channel: usize) {
        self.epoch += 1;
        self.sample = sample;
        self.channel = channel.min(self.lanes.len() - 1);
        self.set_in(self.channel, SAMPLE, sample as f64);
        self.set_in(self.channel, CHANNEL, self.channel as f64);
    }

    #[inline]
    pub fn load(&self, name: &str) -> f64 {
        self.lanes[self.channel].get(name).copied().unwrap_or(0.0)
    }

    /// Store `value` under `name` in the current lane and return it.
    #[inline]
    pub fn store(&mut self, name: &str, value: f64) -> f64 {
        self.set_in(self.channel, name, value);
        value
    }

    /// Store a MIDI controller value as `CC<n>` in every lane.
    pub fn set_control(&mut self, controller: u8, value: f64) {
        let name = format!("CC{}", controller);
        for lane in 0..self.lanes.len() {
            self.set_in(lane, &name, value);
        }
    }

    pub fn midi(&self) -> &Arc<MidiSnapshot> {
        &self.midi
    }

    pub fn set_midi(&mut self, snapshot: Arc<MidiSnapshot>) {
        self.midi = snapshot;
    }

    fn set_in(&mut self, lane: usize, name: &str, value: f64) {
        let symbols = &mut self.lanes[lane];
        match symbols.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                symbols.insert(name.to_owned(), value);
            }
        }
    }
}
