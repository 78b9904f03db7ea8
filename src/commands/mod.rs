mod builtin;

use serde_json::Value;

use crate::error::CommandError;
use crate::event::ExperimentEvent;

/// One typed argument of a scripted command, for tooling and introspection.
#[derive(Debug, Clone, Copy)]
pub struct CommandArgument {
    pub name: &'static str,
    pub description: &'static str,
}

/// Translates one scripted command into an engine event.
///
/// Interpreters are stateless: argument payloads travel inside the produced
/// event. Each command also declares a human-readable description and its
/// argument list.
pub trait CommandInterpreter: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn arguments(&self) -> &'static [CommandArgument];

    fn interpret(&self, args: &Value) -> Result<ExperimentEvent, CommandError>;
}

/// The registry of addressable commands, in registration order.
pub struct CommandSet {
    commands: Vec<Box<dyn CommandInterpreter>>,
}

impl CommandSet {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// All commands the recording engine exposes.
    pub fn builtin() -> Self {
        let mut set = Self::new();
        builtin::register(&mut set);
        set
    }

    pub fn register(&mut self, interpreter: Box<dyn CommandInterpreter>) {
        self.commands.push(interpreter);
    }

    pub fn get(&self, name: &str) -> Option<&dyn CommandInterpreter> {
        self.commands
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    pub fn interpret(&self, name: &str, args: &Value) -> Result<ExperimentEvent, CommandError> {
        self.get(name)
            .ok_or_else(|| CommandError::UnknownCommand(name.to_owned()))?
            .interpret(args)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn CommandInterpreter> {
        self.commands.iter().map(|c| c.as_ref())
    }
}

impl Default for CommandSet {
    fn default() -> Self {
        Self::new()
    }
}

fn required_str<'a>(
    command: &'static str,
    args: &'a Value,
    argument: &'static str,
) -> Result<&'a str, CommandError> {
    match args.get(argument) {
        Some(value) => value
            .as_str()
            .ok_or(CommandError::InvalidArgument { command, argument }),
        None => Err(CommandError::MissingArgument { command, argument }),
    }
}

fn optional_str<'a>(
    command: &'static str,
    args: &'a Value,
    argument: &'static str,
) -> Result<Option<&'a str>, CommandError> {
    match args.get(argument) {
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or(CommandError::InvalidArgument { command, argument }),
        None => Ok(None),
    }
}

fn optional_f32(
    command: &'static str,
    args: &Value,
    argument: &'static str,
) -> Result<Option<f32>, CommandError> {
    match args.get(argument) {
        Some(value) => value
            .as_f64()
            .map(|v| Some(v as f32))
            .ok_or(CommandError::InvalidArgument { command, argument }),
        None => Ok(None),
    }
}

fn optional_i32(
    command: &'static str,
    args: &Value,
    argument: &'static str,
) -> Result<Option<i32>, CommandError> {
    match args.get(argument) {
        Some(value) => value
            .as_i64()
            .map(|v| Some(v as i32))
            .ok_or(CommandError::InvalidArgument { command, argument }),
        None => Ok(None),
    }
}
