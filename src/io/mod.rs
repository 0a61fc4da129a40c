// Purpose - external interfaces, format conversions

pub mod converter;
#[cfg(feature = "device")]
pub mod device;
pub mod midi;
pub mod sink;
pub mod wav;

pub use converter::{encode_sample, HEADROOM_SCALE};
#[cfg(feature = "device")]
pub use device::DeviceSink;
pub use midi::MidiEvent;
pub use sink::{PcmSink, RawPcmSink};
pub use wav::WavSink;
