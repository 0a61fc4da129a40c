//! loom - session wiring: patch source, sink, console and interrupts

use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use log::info;

use liveloom::io::{PcmSink, RawPcmSink, WavSink};
use liveloom::runtime::{self, RunSummary};
use liveloom::script::ScriptSource;
use liveloom::synth::MidiBus;
use liveloom::Driver;

use super::{console, Cli};

pub fn run(cli: Cli) -> EyreResult<()> {
    let config = cli.engine_config();

    let mut source = ScriptSource::new(&cli.script);
    if let Some(seed) = cli.seed {
        source = source.with_seed(seed);
    }
    let (driver, reloader) = runtime::launch(&config, Box::new(source))
        .wrap_err_with(|| format!("failed to start {}", cli.script.display()))?;

    let stop = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&stop))
        .wrap_err("failed to install the interrupt handler")?;

    let bus = MidiBus::new();
    let mut driver = driver.with_midi(bus.clone());
    let _midi = open_midi(cli.midi_port, bus)?;

    let summary = if let Some(export) = &config.export {
        // Offline: no console, the frame limit ends the session.
        let mut sink = WavSink::create(&export.path, config.sample_rate, config.channels)
            .wrap_err_with(|| format!("failed to create {}", export.path.display()))?;
        let frames = export.frames(config.sample_rate);
        info!("exporting {} frames to {}", frames, export.path.display());
        render(&mut driver, &mut sink, &stop, Some(frames))?
    } else {
        console::spawn(reloader, Arc::clone(&stop)).wrap_err("failed to start the console")?;
        if cli.stdout {
            let mut sink = RawPcmSink::new(io::stdout().lock());
            render(&mut driver, &mut sink, &stop, None)?
        } else {
            play(&mut driver, &config, &stop)?
        }
    };

    if summary.interrupted {
        info!("interrupted after {} frames", summary.frames);
    }
    Ok(())
}

fn render<S: PcmSink + ?Sized>(
    driver: &mut Driver,
    sink: &mut S,
    stop: &AtomicBool,
    limit: Option<u64>,
) -> EyreResult<RunSummary> {
    driver.run(sink, stop, limit).wrap_err("render loop failed")
}

#[cfg(feature = "device")]
fn play(
    driver: &mut Driver,
    config: &liveloom::EngineConfig,
    stop: &AtomicBool,
) -> EyreResult<RunSummary> {
    let mut sink = liveloom::io::DeviceSink::open(config.sample_rate, config.channels)
        .wrap_err("failed to open the audio device")?;
    info!("playing... press Ctrl+C to stop");
    render(driver, &mut sink, stop, None)
}

#[cfg(not(feature = "device"))]
fn play(
    _driver: &mut Driver,
    _config: &liveloom::EngineConfig,
    _stop: &AtomicBool,
) -> EyreResult<RunSummary> {
    Err(color_eyre::eyre::eyre!(
        "loom was built without the `device` feature; use --export or --stdout"
    ))
}

#[cfg(feature = "midi")]
fn open_midi(
    port: Option<usize>,
    bus: MidiBus,
) -> EyreResult<Option<midir::MidiInputConnection<liveloom::synth::NoteTracker>>> {
    port.map(|index| super::midi::connect(index, bus)).transpose()
}

#[cfg(not(feature = "midi"))]
fn open_midi(port: Option<usize>, _bus: MidiBus) -> EyreResult<Option<()>> {
    if port.is_some() {
        return Err(color_eyre::eyre::eyre!(
            "loom was built without the `midi` feature"
        ));
    }
    Ok(None)
}
