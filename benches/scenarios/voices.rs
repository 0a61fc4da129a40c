//! Polyphony through templates: static chords and MIDI-driven voices.
//!
//! Compares how the cost grows with the number of simultaneous voices.

use std::collections::BTreeMap;
use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion};
use liveloom::graph::Template;
use liveloom::synth::MidiBus;
use liveloom::{Context, GraphBuilder};

use super::render_block;
use crate::SAMPLE_RATE;

const VOICE_COUNTS: &[usize] = &[1, 4, 8, 16];
const BLOCK: usize = 256;

/// `note` through mtof into a filtered saw.
fn voice_template(b: &mut GraphBuilder) -> Arc<Template> {
    b.template(["note"], |v| {
        let note = v.reference("note");
        let freq = v.diatonic(note);
        let osc = v.saw_up(freq);
        Ok(v.lowpass(osc, 2_000.0, 0.707))
    })
    .expect("voice template")
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &count in VOICE_COUNTS {
        let mut b = GraphBuilder::with_seed(0);
        let voice = voice_template(&mut b);
        let offsets: Vec<f64> = (0..count).map(|i| (i * 3) as f64).collect();
        let root = b.chord(&voice, &offsets, 48.0);
        let mut graph = b.finish(root).expect("chord graph");
        let mut ctx = Context::new(SAMPLE_RATE, 1);
        let mut start = 0u64;
        group.bench_with_input(BenchmarkId::new("chord", count), &count, |bench, _| {
            bench.iter(|| {
                let out = render_block(&mut graph, &mut ctx, start, BLOCK);
                start += BLOCK as u64;
                black_box(out)
            })
        });

        let mut b = GraphBuilder::with_seed(0);
        let voice = voice_template(&mut b);
        let root = b.midi_voices(&voice);
        let mut graph = b.finish(root).expect("voices graph");
        let bus = MidiBus::new();
        let held: BTreeMap<u8, u8> = (0..count).map(|i| (48 + i as u8 * 3, 100)).collect();
        bus.replace_active_notes(held);
        let mut ctx = Context::new(SAMPLE_RATE, 1);
        ctx.set_midi(bus.snapshot());
        let mut start = 0u64;
        group.bench_with_input(BenchmarkId::new("midi_voices", count), &count, |bench, _| {
            bench.iter(|| {
                let out = render_block(&mut graph, &mut ctx, start, BLOCK);
                start += BLOCK as u64;
                black_box(out)
            })
        });
    }

    group.finish();
}
