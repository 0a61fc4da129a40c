pub mod config; // Engine settings shared by the library and `loom`
pub mod dsp; // Per-sample signal primitives
pub mod error;
pub mod graph; // Memoized expression graph and its builder
pub mod io; // Sinks, PCM conversion, MIDI bytes
pub mod runtime; // Render driver and hot reload
pub mod script; // Rhai patch language
pub mod sequencing; // Pitch, scales and rhythm helpers
pub mod synth; // MIDI state published to the render thread

pub use config::{EngineConfig, ExportConfig};
pub use error::{BuildError, EngineError, EvalError, SinkError};
pub use graph::{Context, Graph, GraphBuilder, NodeId};
pub use runtime::{Driver, PatchSource, Reloader};
