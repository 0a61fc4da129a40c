use crossbeam_channel::Sender;
use log::{error, info, warn};

use crate::error::BuildError;
use crate::graph::Graph;
use crate::runtime::driver::Patch;

/// Something that can (re)build the performance graph.
///
/// Implemented by the Rhai [`ScriptSource`](crate::script::ScriptSource) and
/// by any closure returning a graph.
pub trait PatchSource: Send {
    fn build(&mut self) -> Result<Graph, BuildError>;

    /// Human-readable origin, used in log lines.
    fn describe(&self) -> String {
        "patch".to_owned()
    }
}

impl<F> PatchSource for F
where
    F: FnMut() -> Result<Graph, BuildError> + Send,
{
    fn build(&mut self) -> Result<Graph, BuildError> {
        self()
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadState {
    Running,
    Reloading,
}

/// Rebuilds the graph on request and publishes it to the driver.
///
/// A failed build leaves the running patch untouched; the error is logged and
/// returned to the caller for display.
pub struct Reloader {
    source: Box<dyn PatchSource>,
    outbox: Sender<Patch>,
    channels: usize,
    state: ReloadState,
    published: u64,
}

impl Reloader {
    pub fn new(source: Box<dyn PatchSource>, outbox: Sender<Patch>, channels: usize) -> Self {
        Self {
            source,
            outbox,
            channels,
            state: ReloadState::Running,
            published: 0,
        }
    }

    pub fn state(&self) -> ReloadState {
        self.state
    }

    /// Successful reloads so far.
    pub fn published(&self) -> u64 {
        self.published
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    /// Build without publishing; used for the initial graph.
    pub fn build(&mut self) -> Result<Graph, BuildError> {
        self.source.build()
    }

    pub fn reload(&mut self) -> Result<(), BuildError> {
        self.state = ReloadState::Reloading;
        info!("reloading {}", self.source.describe());
        let built = self.source.build();
        self.state = ReloadState::Running;

        match built {
            Ok(graph) => {
                info!("built {} nodes", graph.len());
                if self.outbox.send(Patch::new(graph, self.channels)).is_err() {
                    warn!("render loop has stopped; patch discarded");
                    return Ok(());
                }
                self.published += 1;
                Ok(())
            }
            Err(err) => {
                error!("reload failed, keeping the running patch: {}", err);
                Err(err)
            }
        }
    }
}
