pub mod activity;
pub mod collection;
pub mod controller;
pub mod locomotion;
pub mod pose;
pub mod voice;

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::event::{CommandBlockPlayer, ExperimentEvent};
use crate::session::field::DataField;
use crate::tracking::TrackingSample;

pub use activity::ActivityPlugin;
pub use collection::CollectionCounterPlugin;
pub use controller::ControllerPlugin;
pub use locomotion::LocomotionPlugin;
pub use pose::PosePlugin;
pub use voice::VoicePlugin;

const MAX_QUEUED_EVENTS: usize = 1024;

/// Per-frame context handed to plugins: the frame's tracking state and the
/// external command-block player.
pub struct PluginCtx<'a> {
    pub tracking: &'a TrackingSample,
    pub blocks: &'a mut dyn CommandBlockPlayer,
}

/// State shared by every plugin variant: the ordered data fields that become
/// output columns, and the bounded queue of events waiting for the next
/// update cycle.
///
/// Events are queued rather than handled at dispatch time so field ages are
/// always advanced before this frame's events touch them.
#[derive(Debug, Default)]
pub struct PluginCore {
    fields: Vec<(String, DataField)>,
    queue: VecDeque<ExperimentEvent>,
}

impl PluginCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field (column) to future output. An existing field with this
    /// name has its value replaced instead.
    pub fn add_field(&mut self, name: &str, initial: DataField) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, field)) => *field = initial,
            None => self.fields.push((name.to_owned(), initial)),
        }
    }

    /// Removes a field (column) from future output, if present.
    pub fn remove_field(&mut self, name: &str) {
        self.fields.retain(|(n, _)| n != name);
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    pub fn field(&self, name: &str) -> &DataField {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, field)| field)
            .unwrap_or_else(|| panic!("unknown data field `{name}`"))
    }

    pub fn field_mut(&mut self, name: &str) -> &mut DataField {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, field)| field)
            .unwrap_or_else(|| panic!("unknown data field `{name}`"))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &DataField)> {
        self.fields.iter().map(|(n, f)| (n.as_str(), f))
    }

    pub fn advance_ages(&mut self, dt: f32) {
        for (_, field) in &mut self.fields {
            field.advance_age(dt);
        }
    }

    pub fn reset_fields(&mut self) {
        for (_, field) in &mut self.fields {
            field.reset();
        }
    }

    pub fn push_event(&mut self, event: ExperimentEvent) {
        if self.queue.len() >= MAX_QUEUED_EVENTS {
            warn!("plugin event queue full, dropping the oldest event");
            self.queue.pop_front();
        }
        self.queue.push_back(event);
    }

    pub fn pop_event(&mut self) -> Option<ExperimentEvent> {
        self.queue.pop_front()
    }

    pub fn clear_events(&mut self) {
        self.queue.clear();
    }

    /// True if at least one field holds data written during this update
    /// cycle. Fields carrying the undefined value are ignored.
    pub fn write_required(&self) -> bool {
        self.fields
            .iter()
            .any(|(_, field)| !field.is_stale_or_undefined())
    }
}

/// A pluggable telemetry producer contributing named data columns.
///
/// The set of variants is closed and known at build time; the manager holds
/// them behind this capability interface.
pub trait ExperimentPlugin {
    /// Stable name, used as the registry key and the output column-group key.
    fn name(&self) -> &'static str;

    fn core(&self) -> &PluginCore;

    fn core_mut(&mut self) -> &mut PluginCore;

    /// Applies the plugin's section of the configuration document. Optional
    /// keys take their documented defaults; a missing required key is a
    /// fatal configuration error.
    fn configure(&mut self, config: &serde_json::Value) -> Result<(), ConfigError> {
        let _ = config;
        Ok(())
    }

    /// Restores all fields to their initial values and clears internal
    /// accumulators. Called at every session start.
    fn reset(&mut self);

    /// Reacts to one queued event. Only ever called from `update`, after the
    /// field ages were advanced for this frame.
    fn handle_event(&mut self, event: &ExperimentEvent, cx: &mut PluginCtx<'_>);

    /// Polls continuous state and updates any fields that depend on it.
    fn update_internal(&mut self, dt: f32, cx: &mut PluginCtx<'_>);

    /// Drives one update cycle and reports whether this plugin requests a
    /// row to be written. The order is fixed: ages advance first, then the
    /// queued events are drained in arrival order, then the per-frame logic
    /// runs, then freshness is evaluated.
    fn update(&mut self, dt: f32, cx: &mut PluginCtx<'_>) -> bool {
        self.core_mut().advance_ages(dt);
        while let Some(event) = self.core_mut().pop_event() {
            self.handle_event(&event, cx);
        }
        self.update_internal(dt, cx);
        self.core().write_required()
    }
}

/// Manager-owned registry of all known plugin instances, keyed by name.
/// Populated once during startup; registering a name twice replaces the
/// previous instance.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn ExperimentPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Box<dyn ExperimentPlugin>) {
        match self.plugins.iter_mut().find(|p| p.name() == plugin.name()) {
            Some(slot) => {
                debug!("plugin `{}` re-registered, replacing the previous instance", plugin.name());
                *slot = plugin;
            }
            None => self.plugins.push(plugin),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn ExperimentPlugin> {
        self.plugins
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn ExperimentPlugin + 'static)> {
        self.plugins
            .iter_mut()
            .find(|p| p.name() == name)
            .map(|p| p.as_mut())
    }
}

/// Registers one instance of every plugin variant this crate ships.
pub fn register_builtin_plugins(registry: &mut PluginRegistry) {
    registry.register(Box::new(ControllerPlugin::new()));
    registry.register(Box::new(PosePlugin::hmd()));
    registry.register(Box::new(LocomotionPlugin::new()));
    registry.register(Box::new(ActivityPlugin::new()));
    registry.register(Box::new(VoicePlugin::new()));
    registry.register(Box::new(PosePlugin::hands()));
    registry.register(Box::new(CollectionCounterPlugin::new()));
}
