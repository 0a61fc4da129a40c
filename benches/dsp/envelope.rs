//! Benchmarks for the decay envelopes.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use liveloom::dsp::envelope::{ExpEnvelope, LinearEnvelope};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f64; size];

        let mut linear = LinearEnvelope::new();
        group.bench_with_input(BenchmarkId::new("linear", size), &size, |b, _| {
            b.iter(|| {
                linear.trigger(black_box(0.5), SAMPLE_RATE);
                for out in buffer.iter_mut() {
                    *out = linear.next_level();
                }
            })
        });

        let mut exp = ExpEnvelope::new();
        group.bench_with_input(BenchmarkId::new("exponential", size), &size, |b, _| {
            b.iter(|| {
                exp.trigger();
                for out in buffer.iter_mut() {
                    *out = exp.next_level();
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
