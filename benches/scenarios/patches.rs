//! Script compilation and rendering of the bundled patches.
//!
//! Compilation runs on the control thread during a reload, so its cost is
//! latency to the next swap rather than a real-time deadline.

use std::hint::black_box;
use std::path::Path;

use criterion::{BenchmarkId, Criterion};
use liveloom::script::{compile_patch, engine};
use liveloom::{Context, GraphBuilder};

use super::render_block;
use crate::SAMPLE_RATE;

const PATCHES: &[&str] = &["drone", "arpeggio", "pluck"];

fn patch_text(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("patches")
        .join(format!("{}.rhai", name));
    std::fs::read_to_string(&path).expect("bundled patch")
}

pub fn bench_patches(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/patches");
    let engine = engine();

    for &name in PATCHES {
        let text = patch_text(name);

        group.bench_function(BenchmarkId::new("compile", name), |b| {
            b.iter(|| {
                let graph = compile_patch(&engine, black_box(&text), GraphBuilder::with_seed(1));
                black_box(graph.map(|g| g.len()).unwrap_or(0))
            })
        });

        // One 512-frame stereo block of the compiled patch.
        let mut graph =
            compile_patch(&engine, &text, GraphBuilder::with_seed(1)).expect("patch compiles");
        let mut ctx = Context::new(SAMPLE_RATE, 2);
        let mut start = 0u64;
        group.bench_function(BenchmarkId::new("render_512", name), |b| {
            b.iter(|| {
                let out = render_block(&mut graph, &mut ctx, start, 512);
                start += 512;
                black_box(out)
            })
        });
    }

    group.finish();
}
