//! Per-tick evaluation cost of hand-built graphs.
//!
//! A single sine is the floor: everything above it is node dispatch, memo
//! checks and the DSP itself.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use liveloom::{Context, Graph, GraphBuilder};

use super::render_block;
use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn single_sine() -> Graph {
    let mut b = GraphBuilder::with_seed(0);
    let root = b.sine(440.0);
    b.finish(root).expect("sine graph")
}

/// Detuned saws through a swept lowpass, decayed on every beat.
fn subtractive_voice() -> Graph {
    let mut b = GraphBuilder::with_seed(0);
    let saws: Vec<_> = [110.0, 110.7, 109.4].iter().map(|&f| b.saw_up(f)).collect();
    let osc = b.mix(saws);
    let sweep = b.sine(0.5);
    let sweep = b.mul(sweep, 600.0);
    let cutoff = b.add(sweep, 900.0);
    let filtered = b.lowpass(osc, cutoff, 0.9);
    let beat = b.beat(120.0);
    let root = b.envelope_beat(filtered, beat);
    b.finish(root).expect("subtractive graph")
}

/// A 100-stage chain sharing one oscillator: stresses memo lookups.
fn shared_fanout() -> Graph {
    let mut b = GraphBuilder::with_seed(0);
    let osc = b.sine(220.0);
    let mut acc = b.constant(0.0);
    for _ in 0..100 {
        acc = b.add(acc, osc);
    }
    b.finish(acc).expect("fanout graph")
}

fn feedback_delay() -> Graph {
    let mut b = GraphBuilder::with_seed(0);
    let osc = b.triangle(330.0);
    let beat = b.beat(240.0);
    let pluck = b.exp_envelope_beat(osc, beat);
    let root = b.delay(pluck, 0.25, 0.5, 0.6);
    b.finish(root).expect("delay graph")
}

fn chorus_phaser() -> Graph {
    let mut b = GraphBuilder::with_seed(0);
    let osc = b.pulse(220.0, 0.3);
    let wide = b.chorus(osc, 0.8, 0.012, 0.003);
    let root = b.phaser(wide, 700.0, 0.5, 12);
    b.finish(root).expect("chorus graph")
}

pub fn bench_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/graph");

    let graphs: [(&str, fn() -> Graph); 5] = [
        ("single_sine", single_sine),
        ("subtractive_voice", subtractive_voice),
        ("shared_fanout_100", shared_fanout),
        ("feedback_delay", feedback_delay),
        ("chorus_phaser_stereo", chorus_phaser),
    ];

    for &size in BLOCK_SIZES {
        for (name, make) in graphs {
            let mut graph = make();
            let channels = if name.ends_with("stereo") { 2 } else { 1 };
            let mut ctx = Context::new(SAMPLE_RATE, channels);
            let mut start = 0u64;
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, &size| {
                b.iter(|| {
                    let out = render_block(&mut graph, &mut ctx, start, size);
                    start += size as u64;
                    black_box(out)
                })
            });
        }
    }

    group.finish();
}
