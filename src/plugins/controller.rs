use serde_json::Value;

use crate::error::ConfigError;
use crate::event::ExperimentEvent;
use crate::session::field::DataField;

use super::{ExperimentPlugin, PluginCore, PluginCtx};

const CONTROLLER: &str = "controller";
const MOVEMENT: &str = "controllerMovement";

const MOVEMENT_FLAG_KEY: &str = "recordMovementFlag";

/// Records which locomotion controller is active, and optionally whether a
/// spatial transition is in progress.
pub struct ControllerPlugin {
    core: PluginCore,
}

impl ControllerPlugin {
    pub fn new() -> Self {
        let mut core = PluginCore::new();
        core.add_field(CONTROLLER, DataField::always_current());
        Self { core }
    }
}

impl Default for ControllerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl ExperimentPlugin for ControllerPlugin {
    fn name(&self) -> &'static str {
        "controller"
    }

    fn core(&self) -> &PluginCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PluginCore {
        &mut self.core
    }

    fn configure(&mut self, config: &Value) -> Result<(), ConfigError> {
        if let Some(value) = config.get(MOVEMENT_FLAG_KEY) {
            let record_movement = value.as_bool().ok_or(ConfigError::InvalidField {
                plugin: self.name(),
                field: MOVEMENT_FLAG_KEY,
            })?;
            if record_movement {
                self.core.add_field(MOVEMENT, DataField::always_current());
            } else {
                self.core.remove_field(MOVEMENT);
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.core.reset_fields();
    }

    fn handle_event(&mut self, event: &ExperimentEvent, _cx: &mut PluginCtx<'_>) {
        match event {
            ExperimentEvent::SwitchController { controller } => {
                // Each controller switch produces one new output row.
                self.core.field_mut(CONTROLLER).set(controller.clone());
                if self.core.has_field(MOVEMENT) && self.core.field(MOVEMENT).age() > 0.0 {
                    // The movement flag was not written during this event
                    // dispatch, so it no longer applies to the new controller.
                    self.core.field_mut(MOVEMENT).reset();
                }
            }
            ExperimentEvent::SetControllerMovement { moving } => {
                if self.core.has_field(MOVEMENT) {
                    let flag = if *moving { "TRUE" } else { "FALSE" };
                    self.core.field_mut(MOVEMENT).set(flag);
                }
            }
            _ => {}
        }
    }

    fn update_internal(&mut self, _dt: f32, _cx: &mut PluginCtx<'_>) {}
}
