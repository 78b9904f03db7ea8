use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// The experiment configuration document.
///
/// Every section is optional; per-plugin sections are kept as raw JSON and
/// dispatched to the plugin's own configurator.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentConfig {
    /// The string written to the output file where a value is undefined.
    /// The default adopts the R convention for missing values.
    #[serde(default = "default_undefined_value")]
    pub undefined_value: String,
    #[serde(default)]
    pub conditions: Vec<ConditionSpec>,
    #[serde(default)]
    pub triggers: Vec<TriggerSpec>,
    #[serde(default)]
    pub plugins: Vec<serde_json::Value>,
    /// Audio commands are ignored unless this is explicitly set to true.
    #[serde(default)]
    pub enable_audio_recording: bool,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_undefined_value() -> String {
    "NA".to_owned()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl ExperimentConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

/// One named condition and its optional default value.
#[derive(Debug, Clone, Deserialize)]
pub struct ConditionSpec {
    pub name: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// One named trigger over a rotating list of command blocks.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerSpec {
    pub name: String,
    pub participant_rotate_interval: u32,
    pub command_blocks: Vec<String>,
}
