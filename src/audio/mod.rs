pub mod capture;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{error, warn};

use crate::error::AudioError;

pub use capture::CpalProvider;

/// Recording sample rate of the audio output file.
pub const SAMPLE_RATE: u32 = 16_000;

/// Samples pulled from the input per capture-loop iteration.
pub const SAMPLES_PER_BLOCK: usize = 256;

/// A platform audio input delivering mono 16 kHz 16-bit samples.
///
/// `read_block` fills `out` with up to `out.len()` samples and returns how
/// many were written. It must return within a bounded time (roughly one
/// block duration) even when no samples arrive, so the capture thread can
/// observe its shutdown flag.
pub trait AudioInput: Send {
    fn read_block(&mut self, out: &mut [i16]) -> usize;
}

/// Owns the platform side of the audio input. `open` acquires the device and
/// hands out the sample source; `close` releases the device again.
pub trait AudioInputProvider {
    fn open(&mut self) -> Result<Box<dyn AudioInput>, AudioError>;
    fn close(&mut self);
}

/// The background capture loop around one audio input.
///
/// One dedicated thread pulls fixed-size sample blocks and appends them to
/// the recording buffer. The buffer and the input are owned by the thread
/// while it runs and travel back through the join handle, so there is a
/// single writer by construction; the atomic flag only signals shutdown.
/// Stopping pauses the recording: a later start resumes into the same
/// buffer. The thread is always joined, never detached.
pub struct AudioRecorder {
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<(Box<dyn AudioInput>, Vec<i16>)>>,
    parked: Option<(Box<dyn AudioInput>, Vec<i16>)>,
}

impl AudioRecorder {
    pub fn new(input: Box<dyn AudioInput>) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
            parked: Some((input, Vec::new())),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.worker.is_some()
    }

    /// Starts or resumes capturing. A no-op while already capturing.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }
        let Some((mut input, mut samples)) = self.parked.take() else {
            warn!("audio capture state was lost, cannot resume recording");
            return;
        };
        self.running.store(true, Ordering::Release);
        let running = Arc::clone(&self.running);
        self.worker = Some(std::thread::spawn(move || {
            let mut block = [0i16; SAMPLES_PER_BLOCK];
            while running.load(Ordering::Acquire) {
                let count = input.read_block(&mut block);
                samples.extend_from_slice(&block[..count]);
            }
            (input, samples)
        }));
    }

    /// Pauses capturing: clears the run flag and joins the capture thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            match worker.join() {
                Ok(state) => self.parked = Some(state),
                Err(_) => error!("the audio capture thread panicked, recording lost"),
            }
        }
    }

    /// Stops capturing and yields everything recorded during the session.
    pub fn finish(mut self) -> Vec<i16> {
        self.stop();
        self.parked.take().map(|(_, samples)| samples).unwrap_or_default()
    }
}

/// Writes the accumulated recording as a mono 16 kHz 16-bit PCM file.
pub fn save_wav(path: &Path, samples: &[i16]) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
