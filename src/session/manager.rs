use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::audio::{save_wav, AudioInputProvider, AudioRecorder};
use crate::config::ExperimentConfig;
use crate::error::{ConfigError, ExperimentError};
use crate::event::{CommandBlockPlayer, ExperimentEvent};
use crate::plugins::{ExperimentPlugin, PluginCtx, PluginRegistry};
use crate::tracking::TrackingSample;

use super::condition::{ConditionStore, ConditionValue};
use super::trigger::{Trigger, TriggerTable};
use super::writer::RowWriter;

/// Participant numbers above this are not used in practice; the number is
/// embedded two-digit into output file names.
pub const MAX_PARTICIPANT: u32 = 99;

/// The line appended to the output file when a session is aborted. Enough to
/// make statistics software notice the file is incomplete during import.
const ABORT_SENTINEL: &str = "ABORTED!";

const FILE_STAMP_FORMAT: &str = "%A_%d-%m-%Y_%H-%M-%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HaltKind {
    End,
    Abort,
}

/// Orchestrates experiment sessions: lifecycle, condition state, triggers,
/// the active plugins, row emission and the audio capture thread.
///
/// One instance is constructed at startup and passed to every collaborator
/// that needs it. Exactly one session can be active at a time; registered
/// configuration (conditions, triggers, plugins) survives session resets.
pub struct ExperimentManager {
    running: bool,
    audio_recording: bool,
    pending_halt: Option<HaltKind>,
    participant: Option<u32>,
    elapsed: f32,

    conditions: ConditionStore,
    triggers: TriggerTable,
    registry: PluginRegistry,
    active: Vec<String>,

    writer: Option<RowWriter>,
    undefined_value: String,
    output_dir: PathBuf,
    enable_audio: bool,

    audio_provider: Box<dyn AudioInputProvider>,
    recorder: Option<AudioRecorder>,
    audio_path: Option<PathBuf>,

    player: Box<dyn CommandBlockPlayer>,
}

impl ExperimentManager {
    pub fn new(
        registry: PluginRegistry,
        player: Box<dyn CommandBlockPlayer>,
        audio_provider: Box<dyn AudioInputProvider>,
    ) -> Self {
        Self {
            running: false,
            audio_recording: false,
            pending_halt: None,
            participant: None,
            elapsed: 0.0,
            conditions: ConditionStore::new(),
            triggers: TriggerTable::new(),
            registry,
            active: Vec::new(),
            writer: None,
            undefined_value: "NA".to_owned(),
            output_dir: PathBuf::from("."),
            enable_audio: false,
            audio_provider,
            recorder: None,
            audio_path: None,
            player,
        }
    }

    /// Applies a configuration document: output sentinel, conditions,
    /// triggers, the active plugin set and the audio-recording switch.
    /// Existing conditions and triggers are replaced wholesale.
    pub fn configure(&mut self, config: &ExperimentConfig) -> Result<(), ExperimentError> {
        if self.running {
            return Err(ExperimentError::SessionActive);
        }
        self.undefined_value = config.undefined_value.clone();
        self.output_dir = config.output_dir.clone();

        self.conditions.clear_registered();
        for spec in &config.conditions {
            let default = spec
                .value
                .as_ref()
                .map(ConditionValue::from_json)
                .unwrap_or_default();
            self.conditions.add(&spec.name, default)?;
        }

        self.triggers.clear();
        for spec in &config.triggers {
            let trigger = Trigger::new(spec.participant_rotate_interval, spec.command_blocks.clone());
            self.triggers.add(&spec.name, trigger)?;
        }

        // Deactivate everything, then bring up exactly the configured set.
        self.active.clear();
        for entry in &config.plugins {
            let Some(name) = entry.get("name").and_then(|v| v.as_str()) else {
                return Err(ConfigError::PluginMissingName.into());
            };
            match self.enable_plugin(name) {
                Ok(()) => {
                    if let Some(plugin) = self.registry.get_mut(name) {
                        plugin.configure(entry)?;
                    }
                }
                Err(ExperimentError::UnknownPlugin(_)) => {
                    warn!("there is no registered plugin named `{}`", name);
                }
                Err(other) => return Err(other),
            }
        }

        // For privacy reasons, audio recording stays off unless the
        // configuration explicitly enables it.
        self.enable_audio = config.enable_audio_recording;
        Ok(())
    }

    /// Sets the participant number recorded data will be associated with.
    pub fn set_participant(&mut self, number: u32) -> Result<(), ExperimentError> {
        if self.running {
            return Err(ExperimentError::SessionActive);
        }
        self.participant = Some(number);
        Ok(())
    }

    pub fn add_experiment_condition(
        &mut self,
        name: &str,
        default: ConditionValue,
    ) -> Result<(), ExperimentError> {
        if self.running {
            return Err(ExperimentError::SessionActive);
        }
        self.conditions.add(name, default)
    }

    pub fn remove_experiment_condition(&mut self, name: &str) -> Result<(), ExperimentError> {
        if self.running {
            return Err(ExperimentError::SessionActive);
        }
        self.conditions.remove(name)
    }

    pub fn add_experiment_trigger(
        &mut self,
        name: &str,
        trigger: Trigger,
    ) -> Result<(), ExperimentError> {
        if self.running {
            return Err(ExperimentError::SessionActive);
        }
        self.triggers.add(name, trigger)
    }

    pub fn remove_experiment_trigger(&mut self, name: &str) -> Result<(), ExperimentError> {
        if self.running {
            return Err(ExperimentError::SessionActive);
        }
        self.triggers.remove(name)
    }

    /// Adds the plugin to the active set, subscribing it to bus events and
    /// its columns to the output. Enabling an already-active plugin is a
    /// warned no-op.
    pub fn enable_plugin(&mut self, name: &str) -> Result<(), ExperimentError> {
        if self.running {
            return Err(ExperimentError::SessionActive);
        }
        if !self.registry.contains(name) {
            return Err(ExperimentError::UnknownPlugin(name.to_owned()));
        }
        if self.active.iter().any(|n| n == name) {
            warn!("the plugin named `{}` was already active", name);
            return Ok(());
        }
        self.active.push(name.to_owned());
        Ok(())
    }

    /// Removes the plugin from the active set. Disabling an inactive plugin
    /// is a warned no-op.
    pub fn disable_plugin(&mut self, name: &str) -> Result<(), ExperimentError> {
        if self.running {
            return Err(ExperimentError::SessionActive);
        }
        if !self.registry.contains(name) {
            return Err(ExperimentError::UnknownPlugin(name.to_owned()));
        }
        match self.active.iter().position(|n| n == name) {
            Some(index) => {
                self.active.remove(index);
            }
            None => warn!("the plugin named `{}` was not currently active", name),
        }
        Ok(())
    }

    /// Starts a session with the current participant number: opens the
    /// output file, snapshots condition defaults, resets the active plugins,
    /// writes the header and the initial row, and acquires the audio input
    /// if recording is enabled.
    pub fn start(&mut self) -> Result<(), ExperimentError> {
        if self.running {
            return Err(ExperimentError::AlreadyRunning);
        }
        let participant = self.participant.ok_or(ExperimentError::NoParticipant)?;

        let stamp = chrono::Local::now().format(FILE_STAMP_FORMAT).to_string();
        let mut writer = RowWriter::create(&self.output_dir, participant, &stamp)?;
        info!("session output: {}", writer.path().display());

        self.conditions.begin_session();
        for name in &self.active {
            if let Some(plugin) = self.registry.get_mut(name) {
                plugin.reset();
                plugin.core_mut().clear_events();
            }
        }

        let mut header = vec!["participant".to_owned(), "elapsedTime".to_owned()];
        header.extend(self.conditions.names().map(str::to_owned));
        for name in &self.active {
            if let Some(plugin) = self.registry.get(name) {
                header.extend(plugin.core().fields().map(|(field, _)| field.to_owned()));
            }
        }
        writer.write_row(&header)?;
        self.writer = Some(writer);

        if self.enable_audio {
            match self.audio_provider.open() {
                Ok(input) => {
                    self.recorder = Some(AudioRecorder::new(input));
                    self.audio_path = Some(
                        self.output_dir
                            .join(format!("participant_{:02}_{}.wav", participant, stamp)),
                    );
                }
                // The session proceeds without audio; the device stays
                // unavailable for this session's lifetime.
                Err(err) => warn!("audio input could not be opened: {}", err),
            }
        }

        self.running = true;
        // One row just for the initial condition values.
        self.record_state()?;
        Ok(())
    }

    /// Per-frame update. Accumulates session time, updates every active
    /// plugin and appends a row when one of them requests it or a condition
    /// changed since the last row. A pending halt always gets a final row
    /// before it takes effect.
    pub fn update(&mut self, dt: f32, tracking: &TrackingSample) -> Result<(), ExperimentError> {
        if !self.running {
            return Ok(());
        }
        self.elapsed += dt;

        let mut write_request = false;
        {
            let mut cx = PluginCtx {
                tracking,
                blocks: self.player.as_mut(),
            };
            for name in &self.active {
                if let Some(plugin) = self.registry.get_mut(name) {
                    write_request |= plugin.update(dt, &mut cx);
                }
            }
        }

        // Conditions are checked in the same pass, so a condition change and
        // a plugin write request land in the same row.
        let write_required = self.conditions.changed() || write_request;
        if write_required {
            self.record_state()?;
            self.conditions.clear_changed();
        }

        if let Some(halt) = self.pending_halt {
            if !write_required {
                // No write was necessary this frame; still capture the last
                // known state before halting.
                self.record_state()?;
            }
            match halt {
                HaltKind::End => self.end()?,
                HaltKind::Abort => self.abort()?,
            }
        }
        Ok(())
    }

    /// Sets the live value of a registered condition; the next update
    /// opportunity writes a row.
    pub fn set_experiment_condition(
        &mut self,
        name: &str,
        value: ConditionValue,
    ) -> Result<(), ExperimentError> {
        if !self.running {
            return Err(ExperimentError::NotRunning);
        }
        self.conditions.set(name, value)
    }

    /// Increments an integer condition; anything else is left unchanged with
    /// a warning.
    pub fn increment_experiment_condition(
        &mut self,
        name: &str,
        increment: i32,
    ) -> Result<(), ExperimentError> {
        if !self.running {
            return Err(ExperimentError::NotRunning);
        }
        self.conditions.increment(name, increment);
        Ok(())
    }

    /// Executes a registered trigger: resolves the command block for the
    /// current participant and hands it to the block player.
    pub fn fire_trigger(&mut self, name: &str) -> Result<(), ExperimentError> {
        if !self.running {
            return Err(ExperimentError::NotRunning);
        }
        let participant = self.participant.ok_or(ExperimentError::NoParticipant)?;
        match self.triggers.select(name, participant)? {
            Some(block) => self.player.play_block(&block),
            None => warn!("trigger `{}` has no command blocks", name),
        }
        Ok(())
    }

    /// Ends the session and resets everything but the configuration.
    pub fn end(&mut self) -> Result<(), ExperimentError> {
        if self.running {
            info!("session ended after {:.2}s", self.elapsed);
            self.reset()?;
        }
        Ok(())
    }

    /// Aborts the session, marking the output file as incomplete in its
    /// last line.
    pub fn abort(&mut self) -> Result<(), ExperimentError> {
        if self.running {
            if let Some(writer) = self.writer.as_mut() {
                writer.write_line(ABORT_SENTINEL)?;
            }
            warn!("session aborted after {:.2}s", self.elapsed);
            self.reset()?;
        }
        Ok(())
    }

    /// Clears all recorded data and session state. The configuration is not
    /// affected. Safe to call in any state; calling it twice leaves the same
    /// cleared state as once.
    pub fn reset(&mut self) -> Result<(), ExperimentError> {
        // Drop the writer first so the row file is closed before the audio
        // file is written.
        self.writer = None;

        if let Some(recorder) = self.recorder.take() {
            // Joins the capture thread if it is still running, then saves
            // everything that was recorded.
            let samples = recorder.finish();
            if let Some(path) = self.audio_path.take() {
                save_wav(&path, &samples)?;
                info!("audio recording saved: {}", path.display());
            }
            self.audio_provider.close();
        }
        self.audio_path = None;

        self.running = false;
        self.audio_recording = false;
        self.pending_halt = None;
        self.participant = None;
        self.elapsed = 0.0;
        self.conditions.end_session();
        Ok(())
    }

    /// The bus entry point. While a session runs, control events act on the
    /// manager and every event is queued to the active plugins; while idle,
    /// only Start has an effect.
    pub fn handle_event(&mut self, event: &ExperimentEvent) {
        if self.running {
            match event {
                ExperimentEvent::End => {
                    // Latched so the plugins get one last update first.
                    self.pending_halt = Some(HaltKind::End);
                }
                ExperimentEvent::Abort => {
                    self.pending_halt = Some(HaltKind::Abort);
                }
                ExperimentEvent::SetCondition { condition, value } => {
                    if let Err(err) = self.set_experiment_condition(condition, value.clone()) {
                        warn!("set condition rejected: {}", err);
                    }
                }
                ExperimentEvent::IncrementCondition { condition, increment } => {
                    if let Err(err) = self.increment_experiment_condition(condition, *increment) {
                        warn!("increment condition rejected: {}", err);
                    }
                }
                ExperimentEvent::Trigger { trigger } => {
                    if let Err(err) = self.fire_trigger(trigger) {
                        warn!("trigger rejected: {}", err);
                    }
                }
                ExperimentEvent::StartAudioRecording => self.start_audio_recording(),
                ExperimentEvent::StopAudioRecording => self.stop_audio_recording(),
                _ => {}
            }
            for name in &self.active {
                if let Some(plugin) = self.registry.get_mut(name) {
                    plugin.core_mut().push_event(event.clone());
                }
            }
        } else if matches!(event, ExperimentEvent::Start) {
            if let Err(err) = self.start() {
                warn!("session start rejected: {}", err);
            }
        }
    }

    /// Starts or resumes capturing the participant's voice, if recording is
    /// enabled and the platform granted an input.
    fn start_audio_recording(&mut self) {
        if self.audio_recording {
            return;
        }
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.start();
            self.audio_recording = true;
        }
    }

    /// Pauses capturing. The audio file is only written at session teardown.
    fn stop_audio_recording(&mut self) {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.stop();
        }
        self.audio_recording = false;
    }

    /// Appends one row for the current experiment state.
    fn record_state(&mut self) -> Result<(), ExperimentError> {
        if self.writer.is_none() {
            return Err(ExperimentError::NotRunning);
        }
        let participant = self.participant.ok_or(ExperimentError::NoParticipant)?;

        let mut columns = vec![participant.to_string(), format!("{:.2}", self.elapsed)];
        for value in self.conditions.values() {
            columns.push(value.render(&self.undefined_value));
        }
        for name in &self.active {
            if let Some(plugin) = self.registry.get(name) {
                for (_, field) in plugin.core().fields() {
                    // A field only counts as current during the frame it was
                    // modified in, unless it is marked always current.
                    let ignore_old = !field.is_always_current() && field.older_than(0.0);
                    if ignore_old || field.is_undefined() {
                        columns.push(self.undefined_value.clone());
                    } else {
                        columns.push(field.get().to_owned());
                    }
                }
            }
        }

        let writer = self.writer.as_mut().ok_or(ExperimentError::NotRunning)?;
        writer.write_row(&columns)?;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_audio_recording(&self) -> bool {
        self.audio_recording
    }

    pub fn participant(&self) -> Option<u32> {
        self.participant
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed
    }

    /// Probe-safe condition read: an unregistered name yields `Invalid`.
    pub fn get_experiment_condition_value(&self, name: &str) -> ConditionValue {
        self.conditions.value(name)
    }

    pub fn active_plugins(&self) -> &[String] {
        &self.active
    }

    /// The row output path while a session is running.
    pub fn output_path(&self) -> Option<&Path> {
        self.writer.as_ref().map(RowWriter::path)
    }

    /// The audio output path while a session with audio is running.
    pub fn audio_output_path(&self) -> Option<&Path> {
        self.audio_path.as_deref()
    }
}
