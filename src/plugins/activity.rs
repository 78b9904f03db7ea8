use serde_json::Value;

use crate::error::ConfigError;
use crate::event::ExperimentEvent;
use crate::session::field::DataField;
use crate::tracking::{distance, Mat4};

use super::{ExperimentPlugin, PluginCore, PluginCtx};

const MARKER: &str = "activityMarker";
const POSITION: &str = "activityPosition";
const ROTATION: &str = "activityRotation";
const BASE_TURNS: &str = "activityBaseTurns";

const AUTO_MARKER_INTERVAL_KEY: &str = "autoMarkerIntervalSeconds";

/// Continuously accumulates indicators of user activity between markers.
///
/// Position activity is the travelled head distance in tracking space;
/// rotation activity is the travelled distance of the tip of the normalised
/// gaze vector, which is precise enough for the small per-frame changes.
/// Each marker (issued by command, by the auto-marker timer, or implicitly at
/// session end) flushes the accumulated values into the data fields and
/// restarts the accumulation.
pub struct ActivityPlugin {
    core: PluginCore,
    auto_marker_interval: f32,
    position_travelled: f32,
    rotation_travelled: f32,
    base_turns: u32,
    monitoring: bool,
    next_marker: Option<String>,
    last_head: Mat4,
    auto_marker_age: f32,
    next_auto_marker: u32,
}

impl ActivityPlugin {
    pub fn new() -> Self {
        let mut core = PluginCore::new();
        core.add_field(MARKER, DataField::new());
        core.add_field(POSITION, DataField::new());
        core.add_field(ROTATION, DataField::new());
        core.add_field(BASE_TURNS, DataField::new());
        Self {
            core,
            auto_marker_interval: f32::INFINITY,
            position_travelled: 0.0,
            rotation_travelled: 0.0,
            base_turns: 0,
            monitoring: false,
            next_marker: None,
            last_head: Mat4::IDENTITY,
            auto_marker_age: 0.0,
            next_auto_marker: 1,
        }
    }

    fn reset_accumulators(&mut self) {
        self.next_marker = None;
        self.position_travelled = 0.0;
        self.rotation_travelled = 0.0;
        self.base_turns = 0;
    }

    fn reset_auto_markers(&mut self) {
        self.auto_marker_age = 0.0;
        self.next_auto_marker = 1;
    }
}

impl Default for ActivityPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl ExperimentPlugin for ActivityPlugin {
    fn name(&self) -> &'static str {
        "activity"
    }

    fn core(&self) -> &PluginCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PluginCore {
        &mut self.core
    }

    fn configure(&mut self, config: &Value) -> Result<(), ConfigError> {
        self.auto_marker_interval = match config.get(AUTO_MARKER_INTERVAL_KEY) {
            Some(value) => value.as_f64().map(|v| v as f32).ok_or(ConfigError::InvalidField {
                plugin: self.name(),
                field: AUTO_MARKER_INTERVAL_KEY,
            })?,
            // By default, no automatic markers are issued.
            None => f32::INFINITY,
        };
        Ok(())
    }

    fn reset(&mut self) {
        self.core.reset_fields();
        self.reset_accumulators();
        self.reset_auto_markers();
        self.last_head = Mat4::IDENTITY;
        self.monitoring = false;
    }

    fn handle_event(&mut self, event: &ExperimentEvent, _cx: &mut PluginCtx<'_>) {
        match event {
            ExperimentEvent::StepRotate => {
                self.base_turns += 1;
            }
            ExperimentEvent::IssueActivityMarker { marker } => {
                self.next_marker = Some(marker.clone());
            }
            ExperimentEvent::End => {
                // One last marker with the remaining data.
                self.next_marker = Some("End".to_owned());
            }
            _ => {}
        }
    }

    fn update_internal(&mut self, dt: f32, cx: &mut PluginCtx<'_>) {
        if !self.monitoring {
            // First update of this recording: latch the head pose as the
            // starting point without analysing it.
            self.last_head = cx.tracking.head;
            self.monitoring = true;
            return;
        }

        let current = cx.tracking.head;
        self.position_travelled += distance(current.translation(), self.last_head.translation());
        self.rotation_travelled += distance(current.forward(), self.last_head.forward());

        self.auto_marker_age += dt;
        if self.auto_marker_age >= self.auto_marker_interval {
            // Subtract the interval instead of resetting the age, so the
            // long-run marker rate stays phase-locked.
            self.auto_marker_age -= self.auto_marker_interval;
            self.next_marker = Some(format!("Auto{}", self.next_auto_marker));
            self.next_auto_marker += 1;
        }

        if let Some(marker) = self.next_marker.take() {
            let position = self.position_travelled.to_string();
            let rotation = self.rotation_travelled.to_string();
            let turns = self.base_turns.to_string();
            self.core.field_mut(MARKER).set(marker);
            self.core.field_mut(POSITION).set(position);
            self.core.field_mut(ROTATION).set(rotation);
            self.core.field_mut(BASE_TURNS).set(turns);
            self.reset_accumulators();
        }

        self.last_head = current;
    }
}
