use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};
use log::info;

use crate::error::SinkError;
use crate::io::sink::PcmSink;

/// 16-bit PCM WAV file. The header is completed by `finish`.
pub struct WavSink {
    path: PathBuf,
    writer: Option<WavWriter<BufWriter<File>>>,
    frames: u64,
}

impl WavSink {
    pub fn create(path: impl AsRef<Path>, sample_rate: u32, channels: u16) -> Result<Self, SinkError> {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let path = path.as_ref().to_path_buf();
        let writer = WavWriter::create(&path, spec)?;
        Ok(Self {
            path,
            writer: Some(writer),
            frames: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl PcmSink for WavSink {
    fn write_sample(&mut self, sample: i16) -> Result<(), SinkError> {
        let writer = self.writer.as_mut().ok_or(SinkError::Closed)?;
        writer.write_sample(sample)?;
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), SinkError> {
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
            info!("wrote {} frames to {}", self.frames, self.path.display());
        }
        Ok(())
    }
}

impl Drop for WavSink {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            let _ = writer.finalize();
        }
    }
}
