use labtrace::commands::CommandSet;
use labtrace::error::CommandError;
use labtrace::event::{ExperimentEvent, PoseTarget};
use labtrace::session::condition::ConditionValue;
use serde_json::json;

#[test]
fn every_builtin_command_is_documented() {
    let set = CommandSet::builtin();
    let mut count = 0;
    for command in set.iter() {
        assert!(!command.name().is_empty());
        assert!(!command.description().is_empty());
        for argument in command.arguments() {
            assert!(!argument.name.is_empty());
            assert!(!argument.description.is_empty());
        }
        count += 1;
    }
    assert_eq!(count, 14);
}

#[test]
fn unknown_commands_are_rejected() {
    let set = CommandSet::builtin();
    assert!(matches!(
        set.interpret("make_coffee", &json!({})),
        Err(CommandError::UnknownCommand(_))
    ));
}

#[test]
fn set_condition_requires_both_arguments() {
    let set = CommandSet::builtin();
    assert!(matches!(
        set.interpret("set_experiment_condition", &json!({ "condition": "group" })),
        Err(CommandError::MissingArgument { argument: "value", .. })
    ));
    assert!(matches!(
        set.interpret("set_experiment_condition", &json!({ "value": 3 })),
        Err(CommandError::MissingArgument { argument: "condition", .. })
    ));

    let event = set
        .interpret(
            "set_experiment_condition",
            &json!({ "condition": "group", "value": 3 }),
        )
        .unwrap();
    match event {
        ExperimentEvent::SetCondition { condition, value } => {
            assert_eq!(condition, "group");
            assert_eq!(value, ConditionValue::Integer(3));
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[test]
fn increment_defaults_to_one() {
    let set = CommandSet::builtin();
    let event = set
        .interpret("increment_experiment_condition", &json!({ "condition": "score" }))
        .unwrap();
    assert!(matches!(
        event,
        ExperimentEvent::IncrementCondition { increment: 1, .. }
    ));

    let event = set
        .interpret(
            "increment_experiment_condition",
            &json!({ "condition": "score", "increment": -2 }),
        )
        .unwrap();
    assert!(matches!(
        event,
        ExperimentEvent::IncrementCondition { increment: -2, .. }
    ));
}

#[test]
fn trigger_requires_its_name() {
    let set = CommandSet::builtin();
    assert!(matches!(
        set.interpret("experiment_trigger", &json!({})),
        Err(CommandError::MissingArgument { argument: "trigger", .. })
    ));
    let event = set
        .interpret("experiment_trigger", &json!({ "trigger": "go" }))
        .unwrap();
    assert!(matches!(event, ExperimentEvent::Trigger { .. }));
}

#[test]
fn lifecycle_commands_take_no_arguments() {
    let set = CommandSet::builtin();
    assert!(matches!(
        set.interpret("start_experiment", &json!({})).unwrap(),
        ExperimentEvent::Start
    ));
    assert!(matches!(
        set.interpret("end_experiment", &json!({})).unwrap(),
        ExperimentEvent::End
    ));
    assert!(matches!(
        set.interpret("abort_experiment", &json!({})).unwrap(),
        ExperimentEvent::Abort
    ));
    assert!(matches!(
        set.interpret("start_audio_recording", &json!({})).unwrap(),
        ExperimentEvent::StartAudioRecording
    ));
    assert!(matches!(
        set.interpret("stop_audio_recording", &json!({})).unwrap(),
        ExperimentEvent::StopAudioRecording
    ));
}

#[test]
fn pose_recording_commands_carry_the_interval() {
    let set = CommandSet::builtin();
    let event = set
        .interpret("start_hmd_recording", &json!({ "recordIntervalSeconds": 0.05 }))
        .unwrap();
    match event {
        ExperimentEvent::StartPoseRecording { target, interval } => {
            assert_eq!(target, PoseTarget::Hmd);
            assert!((interval.unwrap() - 0.05).abs() < 1e-6);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    // Without the argument, the plugin falls back to its configured default.
    let event = set.interpret("start_hands_recording", &json!({})).unwrap();
    assert!(matches!(
        event,
        ExperimentEvent::StartPoseRecording {
            target: PoseTarget::Hands,
            interval: None,
        }
    ));

    assert!(matches!(
        set.interpret("stop_hands_recording", &json!({})).unwrap(),
        ExperimentEvent::StopPoseRecording {
            target: PoseTarget::Hands
        }
    ));
}

#[test]
fn activity_marker_command_requires_the_name() {
    let set = CommandSet::builtin();
    assert!(matches!(
        set.interpret("issue_activity_marker", &json!({})),
        Err(CommandError::MissingArgument { argument: "marker", .. })
    ));
    let event = set
        .interpret("issue_activity_marker", &json!({ "marker": "room_b" }))
        .unwrap();
    assert!(matches!(event, ExperimentEvent::IssueActivityMarker { .. }));
}

#[test]
fn controller_check_callback_is_optional() {
    let set = CommandSet::builtin();
    assert!(matches!(
        set.interpret("start_controller_check", &json!({})).unwrap(),
        ExperimentEvent::StartControllerCheck {
            callback_block: None
        }
    ));
    let event = set
        .interpret(
            "start_controller_check",
            &json!({ "callbackBlock": "after_check" }),
        )
        .unwrap();
    match event {
        ExperimentEvent::StartControllerCheck { callback_block } => {
            assert_eq!(callback_block.as_deref(), Some("after_check"));
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[test]
fn wrongly_typed_arguments_are_rejected() {
    let set = CommandSet::builtin();
    assert!(matches!(
        set.interpret("experiment_trigger", &json!({ "trigger": 5 })),
        Err(CommandError::InvalidArgument { argument: "trigger", .. })
    ));
    assert!(matches!(
        set.interpret(
            "start_hmd_recording",
            &json!({ "recordIntervalSeconds": "fast" })
        ),
        Err(CommandError::InvalidArgument { .. })
    ));
}
