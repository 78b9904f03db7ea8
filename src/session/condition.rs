use std::collections::BTreeMap;

use tracing::warn;

use crate::error::ExperimentError;

/// The value of an experiment condition. Only 32 bit integers and strings
/// can be used; `Invalid` is the uninitialised state. Values are replaced
/// wholesale on update, never partially mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ConditionValue {
    Integer(i32),
    Text(String),
    #[default]
    Invalid,
}

impl ConditionValue {
    /// Builds a condition value from a JSON value. Anything that is not a
    /// number or a string yields `Invalid` with a warning.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => ConditionValue::Integer(i as i32),
                None => {
                    warn!("could not create a condition value from the JSON number {}", n);
                    ConditionValue::Invalid
                }
            },
            serde_json::Value::String(s) => ConditionValue::Text(s.clone()),
            other => {
                warn!("could not create a condition value from the JSON value {}", other);
                ConditionValue::Invalid
            }
        }
    }

    /// The output-file representation, with `Invalid` mapped to the
    /// configured undefined-value sentinel.
    pub fn render(&self, undefined: &str) -> String {
        match self {
            ConditionValue::Integer(i) => i.to_string(),
            ConditionValue::Text(s) => s.clone(),
            ConditionValue::Invalid => undefined.to_owned(),
        }
    }
}

/// Named experimenter-controlled state recorded as a column in every row.
///
/// Registered defaults survive sessions; the live map is repopulated from the
/// defaults at session start and cleared at session end, so its key set is
/// fixed for the whole session.
#[derive(Debug, Default)]
pub struct ConditionStore {
    defaults: BTreeMap<String, ConditionValue>,
    live: BTreeMap<String, ConditionValue>,
    changed: bool,
}

impl ConditionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new condition. Condition names have to be unique.
    pub fn add(&mut self, name: &str, default: ConditionValue) -> Result<(), ExperimentError> {
        if self.defaults.contains_key(name) {
            return Err(ExperimentError::DuplicateCondition(name.to_owned()));
        }
        self.defaults.insert(name.to_owned(), default);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<(), ExperimentError> {
        if self.defaults.remove(name).is_none() {
            return Err(ExperimentError::UnknownCondition(name.to_owned()));
        }
        Ok(())
    }

    pub fn clear_registered(&mut self) {
        self.defaults.clear();
    }

    /// Copies the registered defaults into the live map.
    pub fn begin_session(&mut self) {
        self.live = self.defaults.clone();
        self.changed = false;
    }

    pub fn end_session(&mut self) {
        self.live.clear();
        self.changed = false;
    }

    /// Sets the live value of a registered condition and marks the change so
    /// the next update opportunity writes a row.
    pub fn set(&mut self, name: &str, value: ConditionValue) -> Result<(), ExperimentError> {
        match self.live.get_mut(name) {
            Some(slot) => {
                *slot = value;
                self.changed = true;
                Ok(())
            }
            None => Err(ExperimentError::UnknownCondition(name.to_owned())),
        }
    }

    /// Increments an integer condition. Anything else is left unchanged with
    /// a warning.
    pub fn increment(&mut self, name: &str, increment: i32) {
        match self.live.get(name) {
            Some(ConditionValue::Integer(current)) => {
                let next = current.wrapping_add(increment);
                let _ = self.set(name, ConditionValue::Integer(next));
            }
            Some(_) => warn!("condition `{}` does not hold an integer, increment ignored", name),
            None => warn!("condition `{}` is not registered, increment ignored", name),
        }
    }

    /// Probe-safe read: an unregistered name yields `Invalid` plus a warning
    /// instead of an error.
    pub fn value(&self, name: &str) -> ConditionValue {
        match self.live.get(name) {
            Some(value) => value.clone(),
            None => {
                warn!("could not find a condition value named `{}`", name);
                ConditionValue::Invalid
            }
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.live.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &ConditionValue> {
        self.live.values()
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn clear_changed(&mut self) {
        self.changed = false;
    }
}
