//! Error taxonomy for graph construction, evaluation, output and the driver.
//!
//! Construction errors are always recoverable by keeping the previous graph.
//! Evaluation errors are recoverable only while a fallback patch exists. Sink
//! failures end the session.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Raised while building a graph, never while rendering one.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid argument for {node}: {reason}")]
    InvalidArgument { node: &'static str, reason: String },

    #[error("unknown scale `{0}`")]
    UnknownScale(String),

    #[error("scale root {0} is outside 0..=11")]
    InvalidRoot(i64),

    #[error("scale mask allows no notes")]
    EmptyScale,

    #[error("feedback slot {0} was never closed")]
    UnresolvedFeedback(u32),

    #[error("feedback slot {0} was closed twice")]
    FeedbackClosedTwice(u32),

    #[error("node {node} refers to node {operand}, which is not an earlier node of the same graph")]
    DanglingOperand { node: u32, operand: u32 },

    #[error("sync source {0} is not an oscillator")]
    InvalidSync(u32),

    #[error("template has no parameter named `{0}`")]
    UnknownParameter(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("script error: {0}")]
    Script(String),
}

impl BuildError {
    pub(crate) fn invalid(node: &'static str, reason: impl Into<String>) -> Self {
        BuildError::InvalidArgument {
            node,
            reason: reason.into(),
        }
    }
}

/// Raised by a node while rendering.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("history lag {0} is negative, non-finite or too large")]
    InvalidLag(f64),

    #[error("wavefolder fold count {0} is non-finite or too large")]
    InvalidFolds(f64),

    #[error("node #{0} does not exist in this graph")]
    UnknownNode(u32),
}

/// Raised by an output sink. Always fatal for the session.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("audio device failed: {0}")]
    Device(String),

    #[error("sink was already finished")]
    Closed,
}

/// Fatal driver errors: the session ends when one of these surfaces.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("evaluation failed and no fallback patch is available: {0}")]
    Evaluation(#[from] EvalError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("invalid configuration: {0}")]
    Config(String),
}
