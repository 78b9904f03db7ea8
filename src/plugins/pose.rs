use serde_json::Value;

use crate::error::ConfigError;
use crate::event::{ExperimentEvent, PoseTarget};
use crate::session::field::DataField;

use super::{ExperimentPlugin, PluginCore, PluginCtx};

// The matrices are represented column-major; field index is c * 4 + r.
const HMD_FIELDS: [&str; 16] = [
    "HMDMatrixC0R0", "HMDMatrixC0R1", "HMDMatrixC0R2", "HMDMatrixC0R3",
    "HMDMatrixC1R0", "HMDMatrixC1R1", "HMDMatrixC1R2", "HMDMatrixC1R3",
    "HMDMatrixC2R0", "HMDMatrixC2R1", "HMDMatrixC2R2", "HMDMatrixC2R3",
    "HMDMatrixC3R0", "HMDMatrixC3R1", "HMDMatrixC3R2", "HMDMatrixC3R3",
];
const HANDS_FIELDS: [&str; 16] = [
    "HandsMatrixC0R0", "HandsMatrixC0R1", "HandsMatrixC0R2", "HandsMatrixC0R3",
    "HandsMatrixC1R0", "HandsMatrixC1R1", "HandsMatrixC1R2", "HandsMatrixC1R3",
    "HandsMatrixC2R0", "HandsMatrixC2R1", "HandsMatrixC2R2", "HandsMatrixC2R3",
    "HandsMatrixC3R0", "HandsMatrixC3R1", "HandsMatrixC3R2", "HandsMatrixC3R3",
];

const INTERVAL_KEY: &str = "recordIntervalSeconds";
const AUTO_START_KEY: &str = "autoStart";

const DEFAULT_INTERVAL: f32 = 0.04;

/// Periodically samples a tracking-space pose matrix into 16 columns.
///
/// One instance records the HMD, a second one the hand controller; they are
/// structurally identical. The whole matrix is written rather than a derived
/// rotation representation, which keeps the recorded pose unambiguous.
///
/// The sampling interval is phase-locked: the delay between the target and
/// the actual sampling time is carried into the next interval, so the
/// long-run sampling rate does not drift with per-frame jitter.
pub struct PosePlugin {
    core: PluginCore,
    target: PoseTarget,
    fields: &'static [&'static str; 16],
    interval: f32,
    default_interval: f32,
    last_delay: f32,
    recording: bool,
    auto_record: bool,
}

impl PosePlugin {
    pub fn hmd() -> Self {
        Self::new(PoseTarget::Hmd, &HMD_FIELDS)
    }

    pub fn hands() -> Self {
        Self::new(PoseTarget::Hands, &HANDS_FIELDS)
    }

    fn new(target: PoseTarget, fields: &'static [&'static str; 16]) -> Self {
        let mut core = PluginCore::new();
        for name in fields {
            core.add_field(name, DataField::new());
        }
        Self {
            core,
            target,
            fields,
            interval: DEFAULT_INTERVAL,
            default_interval: DEFAULT_INTERVAL,
            last_delay: 0.0,
            recording: false,
            auto_record: false,
        }
    }

    fn reset_helpers(&mut self) {
        self.interval = self.default_interval;
        self.recording = self.auto_record;
        self.last_delay = 0.0;
    }
}

impl ExperimentPlugin for PosePlugin {
    fn name(&self) -> &'static str {
        match self.target {
            PoseTarget::Hmd => "HMD",
            PoseTarget::Hands => "hands",
        }
    }

    fn core(&self) -> &PluginCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PluginCore {
        &mut self.core
    }

    fn configure(&mut self, config: &Value) -> Result<(), ConfigError> {
        let interval = config
            .get(INTERVAL_KEY)
            .ok_or(ConfigError::MissingField {
                plugin: self.name(),
                field: INTERVAL_KEY,
            })?
            .as_f64()
            .ok_or(ConfigError::InvalidField {
                plugin: self.name(),
                field: INTERVAL_KEY,
            })? as f32;
        self.default_interval = interval;
        self.interval = interval;

        // By default, recording only starts when the start command runs.
        let auto_start = match config.get(AUTO_START_KEY) {
            Some(value) => value.as_bool().ok_or(ConfigError::InvalidField {
                plugin: self.name(),
                field: AUTO_START_KEY,
            })?,
            None => false,
        };
        self.auto_record = auto_start;
        self.recording = auto_start;
        Ok(())
    }

    fn reset(&mut self) {
        self.core.reset_fields();
        self.reset_helpers();
    }

    fn handle_event(&mut self, event: &ExperimentEvent, _cx: &mut PluginCtx<'_>) {
        match event {
            ExperimentEvent::StartPoseRecording { target, interval } if *target == self.target => {
                self.interval = interval.unwrap_or(self.default_interval);
                self.core.reset_fields();
                self.last_delay = 0.0;
                self.recording = true;
            }
            ExperimentEvent::StopPoseRecording { target } if *target == self.target => {
                self.recording = false;
            }
            _ => {}
        }
    }

    fn update_internal(&mut self, _dt: f32, cx: &mut PluginCtx<'_>) {
        // All 16 fields are only ever written together, so checking the age
        // of the first one is enough.
        let next_interval = self.interval - self.last_delay;
        if self.recording && self.core.field(self.fields[0]).older_than(next_interval) {
            self.last_delay = self.core.field(self.fields[0]).age() - next_interval;
            let pose = match self.target {
                PoseTarget::Hmd => cx.tracking.head,
                PoseTarget::Hands => cx.tracking.hand,
            };
            for c in 0..4 {
                for r in 0..4 {
                    let value = pose.elem(c, r).to_string();
                    self.core.field_mut(self.fields[c * 4 + r]).set(value);
                }
            }
        }
    }
}
