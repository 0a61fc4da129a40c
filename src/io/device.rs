use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{error, info, warn};
use rtrb::{Producer, PushError, RingBuffer};

use crate::error::SinkError;
use crate::io::converter::pcm_to_f32;
use crate::io::sink::PcmSink;

/// Samples buffered between the render loop and the device callback.
const RING_FRAMES: usize = 4_096;
const WAIT: Duration = Duration::from_millis(1);
/// Added to the ring's play-out time before `finish` gives up on the device.
const DRAIN_SLACK: Duration = Duration::from_millis(250);

/// How long `finish` waits for a full ring of `frames` to play out.
fn drain_timeout(frames: usize, sample_rate: u32) -> Duration {
    let seconds = frames as f64 / f64::from(sample_rate.max(1));
    Duration::from_secs_f64(seconds * 2.0) + DRAIN_SLACK
}

/// Default output device, fed through a lock-free ring.
///
/// The device callback pops what it needs and pads with silence on underrun;
/// `write_sample` sleeps while the ring is full, which paces the render loop
/// at the device rate.
pub struct DeviceSink {
    producer: Producer<f32>,
    capacity: usize,
    drain_timeout: Duration,
    failed: Arc<AtomicBool>,
    stream: Option<cpal::Stream>,
}

impl DeviceSink {
    pub fn open(sample_rate: u32, channels: u16) -> Result<Self, SinkError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| SinkError::Device("no default output device available".into()))?;
        let config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let capacity = RING_FRAMES * channels as usize;
        let (producer, mut consumer) = RingBuffer::<f32>::new(capacity);
        let failed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&failed);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _| {
                    for out in data.iter_mut() {
                        *out = consumer.pop().unwrap_or(0.0);
                    }
                },
                move |err| {
                    error!("audio device error: {}", err);
                    flag.store(true, Ordering::Relaxed);
                },
                None,
            )
            .map_err(|e| SinkError::Device(e.to_string()))?;
        stream
            .play()
            .map_err(|e| SinkError::Device(e.to_string()))?;

        info!(
            "opened {} at {} Hz, {} channel(s)",
            device.name().unwrap_or_else(|_| "output device".into()),
            sample_rate,
            channels
        );

        Ok(Self {
            producer,
            capacity,
            drain_timeout: drain_timeout(RING_FRAMES, sample_rate),
            failed,
            stream: Some(stream),
        })
    }

    fn check(&self) -> Result<(), SinkError> {
        if self.failed.load(Ordering::Relaxed) {
            return Err(SinkError::Device("output stream failed".into()));
        }
        Ok(())
    }
}

impl PcmSink for DeviceSink {
    fn write_sample(&mut self, sample: i16) -> Result<(), SinkError> {
        if self.stream.is_none() {
            return Err(SinkError::Closed);
        }
        let mut value = pcm_to_f32(sample);
        loop {
            self.check()?;
            match self.producer.push(value) {
                Ok(()) => return Ok(()),
                Err(PushError::Full(rejected)) => {
                    value = rejected;
                    thread::sleep(WAIT);
                }
            }
        }
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        if self.stream.is_none() {
            return Ok(());
        }
        // Let the device play out what is already queued, unless it stalls.
        let deadline = Instant::now() + self.drain_timeout;
        while self.producer.slots() < self.capacity {
            self.check()?;
            if Instant::now() >= deadline {
                warn!(
                    "device stopped consuming; dropping {} queued samples",
                    self.capacity - self.producer.slots()
                );
                break;
            }
            thread::sleep(WAIT);
        }
        self.stream = None;
        Ok(())
    }
}
