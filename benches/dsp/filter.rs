//! Benchmarks for the biquad family and the allpass stage.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use liveloom::dsp::{Allpass, Biquad, BiquadKind};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f64> = (0..size)
            .map(|i| (i as f64 / size as f64) * 2.0 - 1.0)
            .collect();
        let mut buffer = input.clone();

        for (name, kind) in [
            ("lowpass", BiquadKind::LowPass),
            ("highpass", BiquadKind::HighPass),
            ("bandpass", BiquadKind::BandPass),
            ("notch", BiquadKind::Notch),
        ] {
            let mut filter = Biquad::new(kind);
            filter.design(1_000.0, 0.707, SAMPLE_RATE);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    for (out, &x) in buffer.iter_mut().zip(&input) {
                        *out = filter.next_sample(black_box(x));
                    }
                })
            });
        }

        // Redesign on every sample: the cost of a modulated cutoff.
        let mut filter = Biquad::new(BiquadKind::LowPass);
        group.bench_with_input(BenchmarkId::new("lowpass_swept", size), &size, |b, _| {
            b.iter(|| {
                for (i, (out, &x)) in buffer.iter_mut().zip(&input).enumerate() {
                    filter.design(black_box(500.0 + i as f64), 0.707, SAMPLE_RATE);
                    *out = filter.next_sample(x);
                }
            })
        });

        let mut allpass = Allpass::new();
        group.bench_with_input(BenchmarkId::new("allpass", size), &size, |b, _| {
            b.iter(|| {
                for (out, &x) in buffer.iter_mut().zip(&input) {
                    *out = allpass.next_sample(black_box(x), 800.0, SAMPLE_RATE);
                }
            })
        });
    }

    group.finish();
}
