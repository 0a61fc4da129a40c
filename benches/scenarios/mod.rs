//! Benchmarks for complete graphs: evaluation overhead, script patches and
//! polyphonic voices.

mod graph;
mod patches;
mod voices;

pub use graph::bench_graph;
pub use patches::bench_patches;
pub use voices::bench_voices;

use liveloom::{Context, Graph};

/// Render `frames` frames of `graph` across `channels` lanes of `ctx`.
pub fn render_block(graph: &mut Graph, ctx: &mut Context, start: u64, frames: usize) -> f64 {
    let mut sum = 0.0;
    for frame in 0..frames as u64 {
        for channel in 0..ctx.channels() {
            ctx.begin_tick(start + frame, channel);
            sum += graph.tick(ctx).unwrap_or(0.0);
        }
    }
    sum
}
