//! Beep output.
//!
//! The machine reports an edge-triggered beep (sound timer crossing 1 -> 0)
//! with no duration or pitch semantics. The host renders each edge as a
//! short square-wave burst pushed into a ring buffer that the cpal callback
//! drains.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};
use ringbuf::{
    HeapRb,
    traits::{Consumer, Producer, Split},
};

/// Output sample rate.
const SAMPLE_RATE: u32 = 48_000;

/// Beep tone frequency.
const BEEP_HZ: u32 = 440;

/// Beep burst length in samples (~150 ms).
const BURST_SAMPLES: usize = (SAMPLE_RATE as usize * 150) / 1000;

/// Square-wave amplitude.
const BEEP_LEVEL: f32 = 0.25;

/// Beep output handler that manages the cpal stream and ring buffer.
pub struct Beeper {
    _stream: Stream,
    producer: ringbuf::HeapProd<f32>,
    burst: Vec<f32>,
}

impl Beeper {
    /// Create the output stream.
    ///
    /// Returns None if no audio device is available; the emulator then runs
    /// silent.
    #[must_use]
    pub fn new() -> Option<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device()?;

        let config = StreamConfig {
            channels: 1,
            sample_rate: SampleRate(SAMPLE_RATE),
            buffer_size: cpal::BufferSize::Default,
        };

        // Room for two bursts; more than one queued beep is inaudible anyway.
        let ring = HeapRb::<f32>::new(BURST_SAMPLES * 2);
        let (producer, mut consumer) = ring.split();

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for sample in data.iter_mut() {
                        // Silence on underrun: the buffer is only filled
                        // while a beep is sounding.
                        *sample = consumer.try_pop().unwrap_or(0.0);
                    }
                },
                |err| eprintln!("Audio stream error: {err}"),
                None,
            )
            .ok()?;

        stream.play().ok()?;

        // One precomputed square-wave burst, reused for every edge.
        let half_period = SAMPLE_RATE as usize / (BEEP_HZ as usize * 2);
        let burst = (0..BURST_SAMPLES)
            .map(|n| {
                if (n / half_period) % 2 == 0 {
                    BEEP_LEVEL
                } else {
                    -BEEP_LEVEL
                }
            })
            .collect();

        Some(Self {
            _stream: stream,
            producer,
            burst,
        })
    }

    /// Queue one beep burst.
    ///
    /// Stops pushing if the ring is full so a beep storm cannot stall the
    /// cycle loop.
    pub fn beep(&mut self) {
        for &sample in &self.burst {
            if self.producer.try_push(sample).is_err() {
                break;
            }
        }
    }
}
