//! loom - live-coded synthesis from a Rhai patch
//!
//! Run with: cargo run --bin loom -- patches/drone.rhai
//!
//! Type `reload` (or just press enter) after saving the patch to hear the new
//! version; `quit` ends the session.

mod app;
mod console;
#[cfg(feature = "midi")]
mod midi;

use std::path::PathBuf;

use clap::Parser;

use liveloom::config::{ExportConfig, DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE};
use liveloom::EngineConfig;

#[derive(Parser, Debug)]
#[command(name = "loom")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Per-sample synthesis graph with hot reload", long_about = None)]
pub struct Cli {
    /// Patch script; re-read on every reload
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
    sample_rate: u32,

    #[arg(long, default_value_t = DEFAULT_CHANNELS)]
    channels: u16,

    /// Render to a WAV file instead of playing
    #[arg(long, value_name = "PATH", conflicts_with = "stdout")]
    export: Option<PathBuf>,

    /// Length of the export in seconds
    #[arg(long, value_name = "SECS", requires = "export", default_value_t = 10.0)]
    duration: f64,

    /// Write raw little-endian 16-bit PCM to stdout
    #[arg(long)]
    stdout: bool,

    /// Seed for noise and random walks
    #[arg(long)]
    seed: Option<u64>,

    /// Index of the MIDI input port to listen to
    #[arg(long, value_name = "N")]
    midi_port: Option<usize>,
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
            export: self.export.as_ref().map(|path| ExportConfig {
                path: path.clone(),
                duration_secs: self.duration,
            }),
        }
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    app::run(cli)
}
