/// The string value that marks a data field as undefined.
pub const UNDEFINED_VALUE: &str = "";

/// A string data field that keeps track of its age in seconds.
///
/// The age is set back to zero exactly when a new value is set or the field
/// is refreshed; it never resets on its own. An age of zero therefore means
/// "written during the current update cycle", which is the dirty-detection
/// primitive the recording engine is built on.
///
/// An "always current" field is allowed to keep its value across frames: old
/// values still represent reality and are written to every row. Changes to it
/// still count as fresh data, but an aged value alone never requests a write.
#[derive(Debug, Clone, PartialEq)]
pub struct DataField {
    value: String,
    age: f32,
    always_current: bool,
}

impl Default for DataField {
    fn default() -> Self {
        Self::new()
    }
}

impl DataField {
    /// An undefined field.
    pub fn new() -> Self {
        Self {
            value: UNDEFINED_VALUE.to_owned(),
            age: 0.0,
            always_current: false,
        }
    }

    /// An undefined field whose value is always considered current.
    pub fn always_current() -> Self {
        Self {
            always_current: true,
            ..Self::new()
        }
    }

    pub fn with_value(value: impl Into<String>, always_current: bool) -> Self {
        Self {
            value: value.into(),
            age: 0.0,
            always_current,
        }
    }

    /// Sets a new value and reverts the age to zero.
    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.age = 0.0;
    }

    /// Resets the value to be undefined.
    pub fn reset(&mut self) {
        self.set(UNDEFINED_VALUE);
    }

    pub fn advance_age(&mut self, dt: f32) {
        self.age += dt;
    }

    /// Sets the age back to zero without modifying the value.
    pub fn refresh(&mut self) {
        self.age = 0.0;
    }

    pub fn get(&self) -> &str {
        &self.value
    }

    pub fn age(&self) -> f32 {
        self.age
    }

    /// Strictly older than the given reference age.
    pub fn older_than(&self, reference: f32) -> bool {
        self.age > reference
    }

    pub fn is_undefined(&self) -> bool {
        self.value == UNDEFINED_VALUE
    }

    /// Undefined, or last modified in an earlier update cycle.
    pub fn is_stale_or_undefined(&self) -> bool {
        self.older_than(0.0) || self.is_undefined()
    }

    pub fn is_always_current(&self) -> bool {
        self.always_current
    }
}
