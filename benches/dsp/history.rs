//! Benchmarks for the history buffer behind delays.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use liveloom::dsp::HistoryBuffer;

use crate::BLOCK_SIZES;

pub fn bench_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/history");

    // Lags in samples at 44.1kHz
    let lags: &[usize] = &[
        441,    // 10ms
        4_410,  // 100ms
        44_100, // 1 second
    ];

    for &size in BLOCK_SIZES {
        let input: Vec<f64> = (0..size).map(|i| (i as f64 * 0.1).sin()).collect();

        for &lag in lags {
            let mut history = HistoryBuffer::with_lag(lag);
            group.bench_with_input(
                BenchmarkId::new(format!("push_get_{}ms", lag / 44), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        let mut sum = 0.0;
                        for &x in &input {
                            history.push(black_box(x));
                            sum += history.get(black_box(lag));
                        }
                        black_box(sum)
                    })
                },
            );
        }

        // Growth from empty: the first pass over a long lag.
        group.bench_with_input(BenchmarkId::new("grow_to_1s", size), &size, |b, _| {
            b.iter(|| {
                let mut history = HistoryBuffer::new();
                for &x in &input {
                    history.push(x);
                }
                black_box(history.get(black_box(44_100)))
            })
        });
    }

    group.finish();
}
