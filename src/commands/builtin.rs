use serde_json::Value;

use crate::error::CommandError;
use crate::event::{ExperimentEvent, PoseTarget};
use crate::session::condition::ConditionValue;

use super::{
    optional_f32, optional_i32, optional_str, required_str, CommandArgument, CommandInterpreter,
    CommandSet,
};

pub(super) fn register(set: &mut CommandSet) {
    set.register(Box::new(SetConditionCommand));
    set.register(Box::new(IncrementConditionCommand));
    set.register(Box::new(TriggerCommand));
    set.register(Box::new(SimpleCommand {
        name: "start_experiment",
        description: "Starts a new experiment with the participant number that was last set.",
        build: || ExperimentEvent::Start,
    }));
    set.register(Box::new(SimpleCommand {
        name: "end_experiment",
        description: "Ends the current experiment after one final output line.",
        build: || ExperimentEvent::End,
    }));
    set.register(Box::new(SimpleCommand {
        name: "abort_experiment",
        description: "Aborts the current experiment after marking the output file.",
        build: || ExperimentEvent::Abort,
    }));
    set.register(Box::new(SimpleCommand {
        name: "start_audio_recording",
        description: "Starts recording to the audio output file if audio recording was enabled \
                      in the experiment configuration.",
        build: || ExperimentEvent::StartAudioRecording,
    }));
    set.register(Box::new(SimpleCommand {
        name: "stop_audio_recording",
        description: "Stops recording to the audio output file if audio is currently being \
                      recorded.",
        build: || ExperimentEvent::StopAudioRecording,
    }));
    set.register(Box::new(ControllerCheckCommand));
    set.register(Box::new(ActivityMarkerCommand));
    set.register(Box::new(StartPoseRecordingCommand {
        name: "start_hmd_recording",
        description: "Starts recording the HMD's tracking-space matrix and optionally sets the \
                      record interval.",
        target: PoseTarget::Hmd,
    }));
    set.register(Box::new(SimpleCommand {
        name: "stop_hmd_recording",
        description: "Stops recording the HMD's tracking-space matrix.",
        build: || ExperimentEvent::StopPoseRecording {
            target: PoseTarget::Hmd,
        },
    }));
    set.register(Box::new(StartPoseRecordingCommand {
        name: "start_hands_recording",
        description: "Starts recording the hand controller's tracking-space matrix and \
                      optionally sets the record interval.",
        target: PoseTarget::Hands,
    }));
    set.register(Box::new(SimpleCommand {
        name: "stop_hands_recording",
        description: "Stops recording the hand controller's tracking-space matrix.",
        build: || ExperimentEvent::StopPoseRecording {
            target: PoseTarget::Hands,
        },
    }));
}

/// A command without arguments that maps straight to one event.
struct SimpleCommand {
    name: &'static str,
    description: &'static str,
    build: fn() -> ExperimentEvent,
}

impl CommandInterpreter for SimpleCommand {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn arguments(&self) -> &'static [CommandArgument] {
        &[]
    }

    fn interpret(&self, _args: &Value) -> Result<ExperimentEvent, CommandError> {
        Ok((self.build)())
    }
}

struct SetConditionCommand;

impl CommandInterpreter for SetConditionCommand {
    fn name(&self) -> &'static str {
        "set_experiment_condition"
    }

    fn description(&self) -> &'static str {
        "Sets the value of a predefined experiment condition."
    }

    fn arguments(&self) -> &'static [CommandArgument] {
        &[
            CommandArgument {
                name: "condition",
                description: "The predefined name of the condition to set the value of.",
            },
            CommandArgument {
                name: "value",
                description: "The value to set the condition to.",
            },
        ]
    }

    fn interpret(&self, args: &Value) -> Result<ExperimentEvent, CommandError> {
        let condition = required_str(self.name(), args, "condition")?;
        let value = args.get("value").ok_or(CommandError::MissingArgument {
            command: self.name(),
            argument: "value",
        })?;
        Ok(ExperimentEvent::SetCondition {
            condition: condition.to_owned(),
            value: ConditionValue::from_json(value),
        })
    }
}

struct IncrementConditionCommand;

impl CommandInterpreter for IncrementConditionCommand {
    fn name(&self) -> &'static str {
        "increment_experiment_condition"
    }

    fn description(&self) -> &'static str {
        "Increments the integer value of a predefined experiment condition."
    }

    fn arguments(&self) -> &'static [CommandArgument] {
        &[
            CommandArgument {
                name: "condition",
                description: "The predefined name of the condition to increment the value of.",
            },
            CommandArgument {
                name: "increment",
                description: "Optional: the value to add to the condition, 1 by default.",
            },
        ]
    }

    fn interpret(&self, args: &Value) -> Result<ExperimentEvent, CommandError> {
        let condition = required_str(self.name(), args, "condition")?;
        let increment = optional_i32(self.name(), args, "increment")?.unwrap_or(1);
        Ok(ExperimentEvent::IncrementCondition {
            condition: condition.to_owned(),
            increment,
        })
    }
}

struct TriggerCommand;

impl CommandInterpreter for TriggerCommand {
    fn name(&self) -> &'static str {
        "experiment_trigger"
    }

    fn description(&self) -> &'static str {
        "Executes a predefined trigger, which plays a command block depending on the \
         participant number."
    }

    fn arguments(&self) -> &'static [CommandArgument] {
        &[CommandArgument {
            name: "trigger",
            description: "The predefined name of the trigger to execute.",
        }]
    }

    fn interpret(&self, args: &Value) -> Result<ExperimentEvent, CommandError> {
        let trigger = required_str(self.name(), args, "trigger")?;
        Ok(ExperimentEvent::Trigger {
            trigger: trigger.to_owned(),
        })
    }
}

struct ControllerCheckCommand;

impl CommandInterpreter for ControllerCheckCommand {
    fn name(&self) -> &'static str {
        "start_controller_check"
    }

    fn description(&self) -> &'static str {
        "Starts the fixed instruction sequence that lets participants get familiar with the \
         controller."
    }

    fn arguments(&self) -> &'static [CommandArgument] {
        &[CommandArgument {
            name: "callbackBlock",
            description: "Optional: a command block to play when the procedure finished.",
        }]
    }

    fn interpret(&self, args: &Value) -> Result<ExperimentEvent, CommandError> {
        let callback_block = optional_str(self.name(), args, "callbackBlock")?;
        Ok(ExperimentEvent::StartControllerCheck {
            callback_block: callback_block.map(str::to_owned),
        })
    }
}

struct ActivityMarkerCommand;

impl CommandInterpreter for ActivityMarkerCommand {
    fn name(&self) -> &'static str {
        "issue_activity_marker"
    }

    fn description(&self) -> &'static str {
        "Associates the activity data accumulated since the last marker with the given marker \
         name and writes it to the output file."
    }

    fn arguments(&self) -> &'static [CommandArgument] {
        &[CommandArgument {
            name: "marker",
            description: "The name the accumulated data should be associated with.",
        }]
    }

    fn interpret(&self, args: &Value) -> Result<ExperimentEvent, CommandError> {
        let marker = required_str(self.name(), args, "marker")?;
        Ok(ExperimentEvent::IssueActivityMarker {
            marker: marker.to_owned(),
        })
    }
}

struct StartPoseRecordingCommand {
    name: &'static str,
    description: &'static str,
    target: PoseTarget,
}

impl CommandInterpreter for StartPoseRecordingCommand {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn arguments(&self) -> &'static [CommandArgument] {
        &[CommandArgument {
            name: "recordIntervalSeconds",
            description: "Optional: overrides the interval the plug-in was configured with.",
        }]
    }

    fn interpret(&self, args: &Value) -> Result<ExperimentEvent, CommandError> {
        let interval = optional_f32(self.name(), args, "recordIntervalSeconds")?;
        Ok(ExperimentEvent::StartPoseRecording {
            target: self.target,
            interval,
        })
    }
}
