use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapRb};
use tracing::{error, info};

use crate::error::AudioError;

use super::{AudioInput, AudioInputProvider, SAMPLE_RATE};

/// Default input device, reduced to a mono 16 kHz sample source.
///
/// The cpal stream stays on this side; its callback pushes decimated samples
/// into an SPSC ring buffer whose consumer end is handed to the capture
/// thread. Dropping the stream releases the device.
#[derive(Default)]
pub struct CpalProvider {
    stream: Option<cpal::Stream>,
}

impl AudioInputProvider for CpalProvider {
    fn open(&mut self) -> Result<Box<dyn AudioInput>, AudioError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(AudioError::NoDevice)?;
        info!("audio input device: {}", device.name().unwrap_or_default());

        // Look for a rate we can decimate to 16 kHz by an integer factor,
        // preferring the native recording rate.
        let target_rates = [SAMPLE_RATE, 2 * SAMPLE_RATE, 3 * SAMPLE_RATE];
        let mut selected = None;
        for &rate in &target_rates {
            for range in device.supported_input_configs()? {
                if range.min_sample_rate().0 <= rate && range.max_sample_rate().0 >= rate {
                    selected = Some((range.with_sample_rate(cpal::SampleRate(rate)), rate));
                    break;
                }
            }
            if selected.is_some() {
                break;
            }
        }
        let (config, rate) = selected.ok_or(AudioError::NoUsableRate)?;
        let decimation = (rate / SAMPLE_RATE) as usize;
        let channels = config.channels() as usize;
        info!("audio capture at {} Hz, {} channel(s)", rate, channels);

        // One second of backlog between the callback and the capture thread.
        let (mut producer, consumer) = HeapRb::<i16>::new(SAMPLE_RATE as usize).split();
        let mut phase = 0usize;

        let err_fn = |err| error!("audio stream error: {}", err);
        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_input_stream(
                &config.into(),
                move |data: &[f32], _: &_| {
                    push_decimated(data, channels, decimation, &mut phase, &mut producer, |s| {
                        (s * i16::MAX as f32) as i16
                    });
                },
                err_fn,
                None,
            )?,
            cpal::SampleFormat::I16 => device.build_input_stream(
                &config.into(),
                move |data: &[i16], _: &_| {
                    push_decimated(data, channels, decimation, &mut phase, &mut producer, |s| s);
                },
                err_fn,
                None,
            )?,
            _ => return Err(AudioError::UnsupportedFormat),
        };
        stream.play()?;
        self.stream = Some(stream);

        Ok(Box::new(RingInput { consumer }))
    }

    fn close(&mut self) {
        self.stream = None;
    }
}

/// Keeps channel 0 of every `decimation`-th frame. The phase carries across
/// callbacks so the decimation grid stays aligned.
fn push_decimated<T, P, F>(
    data: &[T],
    channels: usize,
    decimation: usize,
    phase: &mut usize,
    producer: &mut P,
    convert: F,
) where
    T: Copy,
    P: Producer<Item = i16>,
    F: Fn(T) -> i16,
{
    for frame in data.chunks(channels.max(1)) {
        if *phase == 0 {
            // The callback must not block; when the capture thread falls
            // behind, samples are dropped.
            let _ = producer.try_push(convert(frame[0]));
        }
        *phase = (*phase + 1) % decimation.max(1);
    }
}

struct RingInput {
    consumer: HeapCons<i16>,
}

impl AudioInput for RingInput {
    fn read_block(&mut self, out: &mut [i16]) -> usize {
        // Wait for a full block, but never longer than a couple of block
        // durations, so the caller can re-check its shutdown flag.
        let deadline = Instant::now() + Duration::from_millis(40);
        while self.consumer.occupied_len() < out.len() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(2));
        }
        self.consumer.pop_slice(out)
    }
}
