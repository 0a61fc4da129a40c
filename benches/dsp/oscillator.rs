//! Benchmarks for the phasor and waveform functions.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use liveloom::dsp::{Phasor, Waveform};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f64; size];

        for waveform in [Waveform::Sine, Waveform::SawUp, Waveform::Pulse, Waveform::Triangle] {
            let mut phasor = Phasor::new();
            phasor.set_frequency(440.0, SAMPLE_RATE);
            group.bench_with_input(BenchmarkId::new(waveform.name(), size), &size, |b, _| {
                b.iter(|| {
                    for out in buffer.iter_mut() {
                        *out = waveform.sample(phasor.advance(), black_box(0.3));
                    }
                    black_box(&buffer);
                })
            });
        }

        // Frequency changes every sample, as under audio-rate FM.
        let mut phasor = Phasor::new();
        group.bench_with_input(BenchmarkId::new("sine_fm", size), &size, |b, _| {
            b.iter(|| {
                for (i, out) in buffer.iter_mut().enumerate() {
                    phasor.set_frequency(black_box(440.0 + i as f64), SAMPLE_RATE);
                    *out = Waveform::Sine.sample(phasor.advance(), 0.0);
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
