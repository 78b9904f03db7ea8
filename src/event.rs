use crate::session::condition::ConditionValue;

/// Which tracked pose a pose-recording command refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseTarget {
    Hmd,
    Hands,
}

/// Every event the recording engine consumes from the external bus.
///
/// Payloads are carried in the variants themselves; there is no out-of-band
/// argument table.
#[derive(Debug, Clone)]
pub enum ExperimentEvent {
    Start,
    End,
    Abort,
    SetCondition {
        condition: String,
        value: ConditionValue,
    },
    IncrementCondition {
        condition: String,
        increment: i32,
    },
    Trigger {
        trigger: String,
    },
    StartAudioRecording,
    StopAudioRecording,
    StartControllerCheck {
        callback_block: Option<String>,
    },
    IssueActivityMarker {
        marker: String,
    },
    StartPoseRecording {
        target: PoseTarget,
        /// Overrides the configured record interval when present.
        interval: Option<f32>,
    },
    StopPoseRecording {
        target: PoseTarget,
    },
    /// The player rotated their base position with the controller.
    StepRotate,
    /// The player was moved to a node without travelling (organisational).
    DirectJump {
        node: String,
    },
    /// The player reached an adjacent locomotion node.
    NodeReached {
        node: String,
        distance: f32,
    },
    /// The player moved forward using the pointer controller.
    Teleport {
        distance: f32,
    },
    SwitchController {
        controller: String,
    },
    SetControllerMovement {
        moving: bool,
    },
    ItemCollected {
        item: String,
        inventory_item: bool,
    },
}

/// The external command-block system, reduced to the one call the engine
/// needs: play a named block.
pub trait CommandBlockPlayer {
    fn play_block(&mut self, block: &str);
}

/// Discards every block request. Stands in where no scripted command system
/// is attached (headless drivers, tests).
#[derive(Debug, Default)]
pub struct NullBlockPlayer;

impl CommandBlockPlayer for NullBlockPlayer {
    fn play_block(&mut self, block: &str) {
        tracing::debug!("command block `{}` requested with no player attached", block);
    }
}
