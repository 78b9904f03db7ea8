use std::path::PathBuf;
use std::time::Duration;

use labtrace::audio::{AudioInput, AudioInputProvider, AudioRecorder, SAMPLE_RATE};
use labtrace::error::AudioError;
use labtrace::event::{ExperimentEvent, NullBlockPlayer};
use labtrace::plugins::{register_builtin_plugins, PluginRegistry};
use labtrace::tracking::TrackingSample;
use labtrace::ExperimentManager;
use serde_json::json;

/// Delivers a deterministic sample ramp, one block per millisecond or so.
struct RampInput {
    next: i16,
}

impl AudioInput for RampInput {
    fn read_block(&mut self, out: &mut [i16]) -> usize {
        std::thread::sleep(Duration::from_millis(1));
        for slot in out.iter_mut() {
            *slot = self.next;
            self.next = self.next.wrapping_add(1);
        }
        out.len()
    }
}

struct RampProvider;

impl AudioInputProvider for RampProvider {
    fn open(&mut self) -> Result<Box<dyn AudioInput>, AudioError> {
        Ok(Box::new(RampInput { next: 0 }))
    }

    fn close(&mut self) {}
}

struct UnavailableProvider;

impl AudioInputProvider for UnavailableProvider {
    fn open(&mut self) -> Result<Box<dyn AudioInput>, AudioError> {
        Err(AudioError::NoDevice)
    }

    fn close(&mut self) {}
}

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("labtrace_audio_{}_{}", tag, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn recorder_appends_blocks_while_running() {
    let mut recorder = AudioRecorder::new(Box::new(RampInput { next: 0 }));
    assert!(!recorder.is_recording());

    recorder.start();
    assert!(recorder.is_recording());
    std::thread::sleep(Duration::from_millis(30));
    recorder.stop();
    assert!(!recorder.is_recording());

    let samples = recorder.finish();
    assert!(!samples.is_empty());
    // The thread owns the buffer, so the ramp is contiguous.
    for (i, &sample) in samples.iter().take(1000).enumerate() {
        assert_eq!(sample, i as i16);
    }
}

#[test]
fn stopping_pauses_and_starting_resumes_into_the_same_buffer() {
    let mut recorder = AudioRecorder::new(Box::new(RampInput { next: 0 }));

    recorder.start();
    std::thread::sleep(Duration::from_millis(20));
    recorder.stop();
    assert!(!recorder.is_recording());

    recorder.start();
    std::thread::sleep(Duration::from_millis(20));
    recorder.stop();

    let samples = recorder.finish();
    // Both segments landed in one buffer and the ramp never restarted.
    assert!(samples.len() >= 2 * 256);
    for (i, &sample) in samples.iter().take(2000).enumerate() {
        assert_eq!(sample, i as i16);
    }
}

#[test]
fn redundant_recorder_calls_are_safe() {
    let mut recorder = AudioRecorder::new(Box::new(RampInput { next: 0 }));
    recorder.stop();
    recorder.stop();
    recorder.start();
    recorder.start();
    std::thread::sleep(Duration::from_millis(10));
    recorder.stop();
    recorder.stop();
    let samples = recorder.finish();
    assert!(!samples.is_empty());
}

fn manager_with(provider: Box<dyn AudioInputProvider>, tag: &str) -> ExperimentManager {
    let mut registry = PluginRegistry::new();
    register_builtin_plugins(&mut registry);
    let mut manager = ExperimentManager::new(registry, Box::new(NullBlockPlayer), provider);
    let config = serde_json::from_value(json!({
        "plugins": [{ "name": "voice" }],
        "enableAudioRecording": true,
        "outputDir": temp_dir(tag).to_str().unwrap()
    }))
    .unwrap();
    manager.configure(&config).unwrap();
    manager
}

#[test]
fn a_session_records_and_saves_audio() {
    let mut manager = manager_with(Box::new(RampProvider), "session");
    manager.set_participant(11).unwrap();
    manager.start().unwrap();

    let wav_path = manager.audio_output_path().unwrap().to_owned();
    assert!(!manager.is_audio_recording());

    manager.handle_event(&ExperimentEvent::StartAudioRecording);
    assert!(manager.is_audio_recording());
    manager.update(0.016, &TrackingSample::default()).unwrap();
    std::thread::sleep(Duration::from_millis(30));

    manager.handle_event(&ExperimentEvent::StopAudioRecording);
    assert!(!manager.is_audio_recording());

    // Resuming keeps appending to the same session recording.
    manager.handle_event(&ExperimentEvent::StartAudioRecording);
    std::thread::sleep(Duration::from_millis(20));

    manager.end().unwrap();
    assert!(!manager.is_audio_recording());

    let reader = hound::WavReader::open(&wav_path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.bits_per_sample, 16);
    assert!(reader.len() > 0);
}

#[test]
fn an_unavailable_device_disables_audio_for_the_session() {
    let mut manager = manager_with(Box::new(UnavailableProvider), "unavailable");
    manager.set_participant(12).unwrap();
    // The session still starts; it just proceeds without audio.
    manager.start().unwrap();
    assert!(manager.audio_output_path().is_none());

    manager.handle_event(&ExperimentEvent::StartAudioRecording);
    assert!(!manager.is_audio_recording());

    manager.end().unwrap();
}

#[test]
fn audio_commands_are_ignored_when_recording_is_disabled() {
    let mut registry = PluginRegistry::new();
    register_builtin_plugins(&mut registry);
    let mut manager =
        ExperimentManager::new(registry, Box::new(NullBlockPlayer), Box::new(RampProvider));
    let config = serde_json::from_value(json!({
        "outputDir": temp_dir("disabled").to_str().unwrap()
    }))
    .unwrap();
    manager.configure(&config).unwrap();
    manager.set_participant(13).unwrap();
    manager.start().unwrap();

    // Audio recording was never enabled in the configuration.
    manager.handle_event(&ExperimentEvent::StartAudioRecording);
    assert!(!manager.is_audio_recording());
    assert!(manager.audio_output_path().is_none());
    manager.end().unwrap();
}
