use thiserror::Error;

/// Fatal problems in the experiment configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("plugin entry without a `name` field")]
    PluginMissingName,
    #[error("plugin `{plugin}`: missing required field `{field}`")]
    MissingField {
        plugin: &'static str,
        field: &'static str,
    },
    #[error("plugin `{plugin}`: field `{field}` has the wrong type")]
    InvalidField {
        plugin: &'static str,
        field: &'static str,
    },
}

/// Recoverable precondition violations and resource failures of the manager.
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("a session is already running")]
    AlreadyRunning,
    #[error("no session is running")]
    NotRunning,
    #[error("the operation is not allowed while a session is running")]
    SessionActive,
    #[error("no participant number has been set")]
    NoParticipant,
    #[error("condition `{0}` is already registered")]
    DuplicateCondition(String),
    #[error("condition `{0}` is not registered")]
    UnknownCondition(String),
    #[error("trigger `{0}` is already registered")]
    DuplicateTrigger(String),
    #[error("trigger `{0}` is not registered")]
    UnknownTrigger(String),
    #[error("plugin `{0}` is not registered")]
    UnknownPlugin(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Audio(#[from] AudioError),
}

/// Failures of the platform audio input or the recording sink.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio input device available")]
    NoDevice,
    #[error("no supported input configuration at 16, 32 or 48 kHz")]
    NoUsableRate,
    #[error("unsupported input sample format")]
    UnsupportedFormat,
    #[error(transparent)]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),
    #[error(transparent)]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error(transparent)]
    PlayStream(#[from] cpal::PlayStreamError),
    #[error(transparent)]
    Wav(#[from] hound::Error),
}

/// Rejections while interpreting a scripted command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("command `{command}`: missing argument `{argument}`")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("command `{command}`: argument `{argument}` has the wrong type")]
    InvalidArgument {
        command: &'static str,
        argument: &'static str,
    },
}
