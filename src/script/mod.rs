//! Rhai front-end for patch definitions.
//!
//! A patch script is ordinary Rhai whose final expression is the output
//! signal. Every builder operation is available as a function; arguments may
//! be node handles, numbers (constants) or strings (symbol loads), and the
//! arithmetic operators build arithmetic nodes:
//!
//! ```text
//! let lfo   = sine(0.25) * 400.0 + 800.0;
//! let voice = template(["note"], || saw_up(diatonic("note")) * 0.2);
//! let notes = chord(voice, [0, 4, 7], 57);
//! lowpass(notes, lfo, 2.0)
//! ```
//!
//! Templates are instantiated with `invoke`, e.g. `voice.invoke(#{ note: 60 })`.
//! Feedback is written as
//!
//! ```text
//! let fb = feedback();
//! close(fb, input + fb.value * 0.5)
//! ```

mod api;
mod handle;

pub use api::{Feedback, TemplateRef, MAX_OPERATIONS};
pub use handle::NodeRef;

use std::fs;
use std::path::{Path, PathBuf};

use rhai::{Dynamic, Engine};

use crate::error::BuildError;
use crate::graph::{Graph, GraphBuilder};
use crate::runtime::PatchSource;

/// A Rhai engine with the patch language registered.
pub fn engine() -> Engine {
    let mut engine = Engine::new();
    api::register(&mut engine);
    engine
}

fn script(err: impl ToString) -> BuildError {
    BuildError::Script(err.to_string())
}

/// Evaluate `text` into a graph using `builder`.
pub fn compile_patch(engine: &Engine, text: &str, builder: GraphBuilder) -> Result<Graph, BuildError> {
    let guard = handle::enter(builder);

    let output: Dynamic = engine.eval(text).map_err(script)?;
    if output.is_unit() {
        return Err(BuildError::Script(
            "the patch must end with an expression (is there a trailing `;`?)".into(),
        ));
    }
    let output = handle::operand(output).map_err(script)?;
    let root = handle::with_builder(|b| b.input(output)).map_err(script)?;

    let builder = guard
        .leave()
        .ok_or_else(|| BuildError::Script("patch scope was lost".into()))?;
    builder.finish(root)
}

/// Re-reads a script file on every build.
pub struct ScriptSource {
    path: PathBuf,
    seed: Option<u64>,
    engine: Engine,
}

impl ScriptSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed: None,
            engine: engine(),
        }
    }

    /// Seed noise and random walks, for reproducible renders.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PatchSource for ScriptSource {
    fn build(&mut self) -> Result<Graph, BuildError> {
        let text = fs::read_to_string(&self.path).map_err(|source| BuildError::Io {
            path: self.path.clone(),
            source,
        })?;
        let builder = match self.seed {
            Some(seed) => GraphBuilder::with_seed(seed),
            None => GraphBuilder::new(),
        };
        compile_patch(&self.engine, &text, builder)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
