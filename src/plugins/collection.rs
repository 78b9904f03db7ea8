use serde_json::Value;

use crate::error::ConfigError;
use crate::event::ExperimentEvent;
use crate::session::field::DataField;

use super::{ExperimentPlugin, PluginCore, PluginCtx};

const ITEMS: &str = "items";

const COMMAND_BLOCKS_KEY: &str = "commandBlocks";
const ONLY_INVENTORY_KEY: &str = "onlyInventoryItems";

/// Counts collected items, optionally restricted to inventory items.
///
/// If command blocks are configured, each qualifying collection plays the
/// next one, cycling through the list endlessly.
pub struct CollectionCounterPlugin {
    core: PluginCore,
    command_blocks: Vec<String>,
    only_inventory: bool,
    current_items: u32,
}

impl CollectionCounterPlugin {
    pub fn new() -> Self {
        let mut core = PluginCore::new();
        core.add_field(ITEMS, DataField::with_value("0", true));
        Self {
            core,
            command_blocks: Vec::new(),
            only_inventory: true,
            current_items: 0,
        }
    }
}

impl Default for CollectionCounterPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl ExperimentPlugin for CollectionCounterPlugin {
    fn name(&self) -> &'static str {
        "collectionCounter"
    }

    fn core(&self) -> &PluginCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PluginCore {
        &mut self.core
    }

    fn configure(&mut self, config: &Value) -> Result<(), ConfigError> {
        self.command_blocks.clear();
        if let Some(value) = config.get(COMMAND_BLOCKS_KEY) {
            let names = value.as_array().ok_or(ConfigError::InvalidField {
                plugin: self.name(),
                field: COMMAND_BLOCKS_KEY,
            })?;
            for name in names {
                let name = name.as_str().ok_or(ConfigError::InvalidField {
                    plugin: self.name(),
                    field: COMMAND_BLOCKS_KEY,
                })?;
                self.command_blocks.push(name.to_owned());
            }
        }
        self.only_inventory = config
            .get(ONLY_INVENTORY_KEY)
            .ok_or(ConfigError::MissingField {
                plugin: self.name(),
                field: ONLY_INVENTORY_KEY,
            })?
            .as_bool()
            .ok_or(ConfigError::InvalidField {
                plugin: self.name(),
                field: ONLY_INVENTORY_KEY,
            })?;
        Ok(())
    }

    fn reset(&mut self) {
        self.core.field_mut(ITEMS).set("0");
        self.current_items = 0;
    }

    fn handle_event(&mut self, event: &ExperimentEvent, cx: &mut PluginCtx<'_>) {
        match event {
            ExperimentEvent::ItemCollected { inventory_item, .. } => {
                if !self.only_inventory || *inventory_item {
                    if !self.command_blocks.is_empty() {
                        // The block associated with the previous count plays
                        // before the count moves on.
                        let index = self.current_items as usize % self.command_blocks.len();
                        cx.blocks.play_block(&self.command_blocks[index]);
                    }
                    self.current_items += 1;
                    self.core.field_mut(ITEMS).set(self.current_items.to_string());
                }
            }
            _ => {}
        }
    }

    fn update_internal(&mut self, _dt: f32, _cx: &mut PluginCtx<'_>) {}
}
