use crate::event::ExperimentEvent;
use crate::session::field::DataField;

use super::{ExperimentPlugin, PluginCore, PluginCtx};

const NODE: &str = "locomotionNode";
const DISTANCE: &str = "locomotionDistance";

/// Records the player's current graph node and the most recently travelled
/// distance, driven entirely by locomotion events.
pub struct LocomotionPlugin {
    core: PluginCore,
}

impl LocomotionPlugin {
    pub fn new() -> Self {
        let mut core = PluginCore::new();
        core.add_field(NODE, DataField::always_current());
        core.add_field(DISTANCE, DataField::new());
        Self { core }
    }
}

impl Default for LocomotionPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl ExperimentPlugin for LocomotionPlugin {
    fn name(&self) -> &'static str {
        "locomotion"
    }

    fn core(&self) -> &PluginCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PluginCore {
        &mut self.core
    }

    fn reset(&mut self) {
        self.core.reset_fields();
    }

    fn handle_event(&mut self, event: &ExperimentEvent, _cx: &mut PluginCtx<'_>) {
        match event {
            ExperimentEvent::DirectJump { node } => {
                // A direct jump is organisational, not locomotion: the new
                // node is recorded with the travelled distance left
                // undefined rather than zero.
                self.core.field_mut(NODE).set(node.clone());
            }
            ExperimentEvent::NodeReached { node, distance } => {
                self.core.field_mut(NODE).set(node.clone());
                self.core.field_mut(DISTANCE).set(distance.to_string());
            }
            ExperimentEvent::Teleport { distance } => {
                self.core.field_mut(DISTANCE).set(distance.to_string());
            }
            _ => {}
        }
    }

    fn update_internal(&mut self, _dt: f32, _cx: &mut PluginCtx<'_>) {}
}
