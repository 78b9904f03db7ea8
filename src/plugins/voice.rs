use crate::event::ExperimentEvent;
use crate::session::field::DataField;

use super::{ExperimentPlugin, PluginCore, PluginCtx};

const RECORDING: &str = "voiceRecording";

/// Mirrors the bus-level start/stop audio-recording events into a boolean
/// column. This is recorded for auditability even when actual audio capture
/// is disabled.
pub struct VoicePlugin {
    core: PluginCore,
    recording: bool,
}

impl VoicePlugin {
    pub fn new() -> Self {
        let mut core = PluginCore::new();
        core.add_field(RECORDING, DataField::with_value("FALSE", true));
        Self {
            core,
            recording: false,
        }
    }
}

impl Default for VoicePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl ExperimentPlugin for VoicePlugin {
    fn name(&self) -> &'static str {
        "voice"
    }

    fn core(&self) -> &PluginCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PluginCore {
        &mut self.core
    }

    fn reset(&mut self) {
        self.core.field_mut(RECORDING).set("FALSE");
        self.recording = false;
    }

    fn handle_event(&mut self, event: &ExperimentEvent, _cx: &mut PluginCtx<'_>) {
        // Only touch the field when the value actually changes.
        match event {
            ExperimentEvent::StartAudioRecording => {
                if !self.recording {
                    self.core.field_mut(RECORDING).set("TRUE");
                    self.recording = true;
                }
            }
            ExperimentEvent::StopAudioRecording | ExperimentEvent::End => {
                if self.recording {
                    self.core.field_mut(RECORDING).set("FALSE");
                    self.recording = false;
                }
            }
            _ => {}
        }
    }

    fn update_internal(&mut self, _dt: f32, _cx: &mut PluginCtx<'_>) {}
}
