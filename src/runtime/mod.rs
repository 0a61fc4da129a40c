//! Real-time rendering and hot reload.
//!
//! A session is two halves joined by a channel:
//!
//! - the [`Driver`] renders frames on the calling thread and adopts new
//!   patches at frame boundaries
//! - the [`Reloader`] rebuilds the graph from its [`PatchSource`] whenever
//!   asked (usually from a console thread) and publishes the result
//!
//! ```ignore
//! let (mut driver, mut reloader) = runtime::launch(&config, Box::new(source))?;
//! std::thread::spawn(move || { let _ = reloader.reload(); });
//! driver.run(&mut sink, &stop, None)?;
//! ```

mod driver;
mod reload;

pub use driver::{Driver, Patch, RunSummary};
pub use reload::{PatchSource, ReloadState, Reloader};

use crossbeam_channel::unbounded;
use log::info;

use crate::config::EngineConfig;
use crate::error::EngineError;

/// Build the initial graph and wire a driver to a reloader.
///
/// There is no fallback yet, so a failing initial build is fatal.
pub fn launch(
    config: &EngineConfig,
    source: Box<dyn PatchSource>,
) -> Result<(Driver, Reloader), EngineError> {
    config.validate()?;
    let channels = usize::from(config.channels);
    let (outbox, inbox) = unbounded();
    let mut reloader = Reloader::new(source, outbox, channels);

    let initial = reloader.build()?;
    info!(
        "initial patch from {}: {} nodes",
        reloader.describe(),
        initial.len()
    );
    let driver = Driver::new(f64::from(config.sample_rate), channels, initial, inbox);
    Ok((driver, reloader))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;
    use crate::graph::{Graph, GraphBuilder};

    #[test]
    fn test_failing_initial_build_is_fatal() {
        let source = || -> Result<Graph, BuildError> { Err(BuildError::Script("nope".into())) };
        let result = launch(&EngineConfig::default(), Box::new(source));
        assert!(matches!(result, Err(EngineError::Build(_))));
    }

    #[test]
    fn test_launch_uses_configured_channels() {
        let source = || {
            let mut b = GraphBuilder::with_seed(0);
            let root = b.constant(0.25);
            b.finish(root)
        };
        let config = EngineConfig {
            channels: 2,
            ..EngineConfig::default()
        };
        let (mut driver, _reloader) = launch(&config, Box::new(source)).unwrap();
        assert_eq!(driver.render_frame().unwrap(), &[0.25, 0.25]);
    }
}
