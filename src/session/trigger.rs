use std::collections::HashMap;

use crate::error::ExperimentError;

/// A rotating selection of command blocks indexed by participant number.
///
/// The rotate interval defines how many participants in a row are assigned
/// one command block; blocks rotate endlessly over the whole range of
/// participant numbers.
#[derive(Debug, Clone)]
pub struct Trigger {
    commands: Vec<String>,
    rotate_interval: u32,
}

impl Trigger {
    pub fn new(rotate_interval: u32, commands: Vec<String>) -> Self {
        Self {
            commands,
            rotate_interval: rotate_interval.max(1),
        }
    }

    /// The command block selected for the given participant, or `None` for a
    /// trigger without blocks.
    pub fn command_block(&self, participant: u32) -> Option<&str> {
        if self.commands.is_empty() {
            return None;
        }
        let index = (participant / self.rotate_interval) as usize % self.commands.len();
        Some(&self.commands[index])
    }
}

/// The named triggers of the current configuration. Created and replaced at
/// configuration time, read-only while a session runs.
#[derive(Debug, Default)]
pub struct TriggerTable {
    triggers: HashMap<String, Trigger>,
}

impl TriggerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new trigger. Trigger names have to be unique.
    pub fn add(&mut self, name: &str, trigger: Trigger) -> Result<(), ExperimentError> {
        if self.triggers.contains_key(name) {
            return Err(ExperimentError::DuplicateTrigger(name.to_owned()));
        }
        self.triggers.insert(name.to_owned(), trigger);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<(), ExperimentError> {
        if self.triggers.remove(name).is_none() {
            return Err(ExperimentError::UnknownTrigger(name.to_owned()));
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.triggers.clear();
    }

    /// Resolves the command block a fired trigger selects for the given
    /// participant.
    pub fn select(&self, name: &str, participant: u32) -> Result<Option<String>, ExperimentError> {
        match self.triggers.get(name) {
            Some(trigger) => Ok(trigger.command_block(participant).map(str::to_owned)),
            None => Err(ExperimentError::UnknownTrigger(name.to_owned())),
        }
    }
}
