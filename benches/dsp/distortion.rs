//! Benchmarks for saturation and wavefolding.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use liveloom::dsp::distortion;

use crate::BLOCK_SIZES;

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/distortion");

    for &size in BLOCK_SIZES {
        let input: Vec<f64> = (0..size)
            .map(|i| ((i as f64 / size as f64) * 2.0 - 1.0) * 3.0)
            .collect();
        let mut buffer = vec![0.0f64; size];

        group.bench_with_input(BenchmarkId::new("soft_saturate", size), &size, |b, _| {
            b.iter(|| {
                for (out, &x) in buffer.iter_mut().zip(&input) {
                    *out = distortion::soft_saturate(black_box(x), 0.8);
                }
            })
        });

        group.bench_with_input(BenchmarkId::new("hard_saturate", size), &size, |b, _| {
            b.iter(|| {
                for (out, &x) in buffer.iter_mut().zip(&input) {
                    *out = distortion::hard_saturate(black_box(x), 0.8);
                }
            })
        });

        for folds in [1, 4, 16] {
            group.bench_with_input(
                BenchmarkId::new(format!("wavefold_{}", folds), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        for (out, &x) in buffer.iter_mut().zip(&input) {
                            *out = distortion::wavefold(black_box(x), folds, 2.0, 0.5);
                        }
                    })
                },
            );
        }
    }

    group.finish();
}
