use std::io::Write;

use crate::error::SinkError;

/// Destination for rendered PCM.
///
/// The driver writes one sample per channel and then calls `end_frame`.
/// Writes may block; that is the render loop's only backpressure.
pub trait PcmSink {
    fn write_sample(&mut self, sample: i16) -> Result<(), SinkError>;

    /// Called after every channel of a frame was written.
    fn end_frame(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Flush and close. Writing after `finish` is an error.
    fn finish(&mut self) -> Result<(), SinkError>;
}

/// Collects samples in memory.
impl PcmSink for Vec<i16> {
    fn write_sample(&mut self, sample: i16) -> Result<(), SinkError> {
        self.push(sample);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: PcmSink + ?Sized> PcmSink for Box<S> {
    fn write_sample(&mut self, sample: i16) -> Result<(), SinkError> {
        (**self).write_sample(sample)
    }

    fn end_frame(&mut self) -> Result<(), SinkError> {
        (**self).end_frame()
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        (**self).finish()
    }
}

/// Interleaved little-endian signed 16-bit PCM on any byte stream.
#[derive(Debug)]
pub struct RawPcmSink<W: Write> {
    writer: W,
    finished: bool,
}

impl<W: Write> RawPcmSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            finished: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> PcmSink for RawPcmSink<W> {
    fn write_sample(&mut self, sample: i16) -> Result<(), SinkError> {
        if self.finished {
            return Err(SinkError::Closed);
        }
        self.writer.write_all(&sample.to_le_bytes())?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        if !self.finished {
            self.finished = true;
            self.writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_sink_writes_little_endian() {
        let mut sink = RawPcmSink::new(Vec::new());
        sink.write_sample(0x0102).unwrap();
        sink.write_sample(-2).unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.into_inner(), vec![0x02, 0x01, 0xFE, 0xFF]);
    }

    #[test]
    fn test_raw_sink_rejects_writes_after_finish() {
        let mut sink = RawPcmSink::new(Vec::new());
        sink.finish().unwrap();
        assert!(matches!(sink.write_sample(1), Err(SinkError::Closed)));
    }

    #[test]
    fn test_boxed_sink_forwards() {
        let mut sink: Box<dyn PcmSink> = Box::new(Vec::<i16>::new());
        sink.write_sample(7).unwrap();
        sink.end_frame().unwrap();
        sink.finish().unwrap();
    }
}
