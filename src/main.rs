use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use tracing::info;

use labtrace::audio::CpalProvider;
use labtrace::commands::CommandSet;
use labtrace::config::ExperimentConfig;
use labtrace::event::{ExperimentEvent, NullBlockPlayer};
use labtrace::plugins::{register_builtin_plugins, PluginRegistry};
use labtrace::tracking::{Mat4, TrackingSample};
use labtrace::ExperimentManager;

/// Used when no configuration file is passed on the command line.
const DEMO_CONFIG: &str = r#"{
    "undefinedValue": "NA",
    "conditions": [
        { "name": "group", "value": 1 },
        { "name": "phase", "value": "baseline" }
    ],
    "triggers": [
        {
            "name": "encourage",
            "participantRotateInterval": 1,
            "commandBlocks": ["cheer_a", "cheer_b"]
        }
    ],
    "plugins": [
        { "name": "activity", "autoMarkerIntervalSeconds": 2.0 },
        { "name": "HMD", "recordIntervalSeconds": 0.1, "autoStart": true },
        { "name": "locomotion" },
        { "name": "voice" }
    ],
    "enableAudioRecording": false
}"#;

const FRAME_SECONDS: f32 = 0.016;

/// Drives one synthetic session: scripted commands arrive on the bus channel
/// while the frame loop feeds the manager a moving head pose.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => ExperimentConfig::from_json_file(path)?,
        None => ExperimentConfig::from_json(DEMO_CONFIG)?,
    };

    let mut registry = PluginRegistry::new();
    register_builtin_plugins(&mut registry);
    let mut manager = ExperimentManager::new(
        registry,
        Box::new(NullBlockPlayer),
        Box::new(CpalProvider::default()),
    );
    manager.configure(&config)?;
    manager.set_participant(1)?;

    let (tx, mut rx) = mpsc::channel::<ExperimentEvent>(100);
    let commands = CommandSet::builtin();

    // The stand-in for the external command-block system.
    let script = tokio::spawn(async move {
        post(&commands, &tx, "start_experiment", json!({})).await;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        post(&commands, &tx, "issue_activity_marker", json!({ "marker": "midpoint" })).await;
        post(
            &commands,
            &tx,
            "set_experiment_condition",
            json!({ "condition": "phase", "value": "trial" }),
        )
        .await;
        tokio::time::sleep(Duration::from_millis(1000)).await;
        post(
            &commands,
            &tx,
            "increment_experiment_condition",
            json!({ "condition": "group", "increment": 2 }),
        )
        .await;
        post(&commands, &tx, "experiment_trigger", json!({ "trigger": "encourage" })).await;
        tokio::time::sleep(Duration::from_millis(1000)).await;
        post(&commands, &tx, "end_experiment", json!({})).await;
    });

    let mut cadence = tokio::time::interval(Duration::from_millis(16));
    cadence.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut clock = 0.0f32;
    let mut was_running = false;
    loop {
        cadence.tick().await;

        while let Ok(event) = rx.try_recv() {
            manager.handle_event(&event);
        }

        clock += FRAME_SECONDS;
        let tracking = TrackingSample {
            head: Mat4::from_translation([clock.sin() * 0.5, 1.7, clock.cos() * 0.5]),
            hand: Mat4::from_translation([0.2, 1.2, 0.3]),
        };
        manager.update(FRAME_SECONDS, &tracking)?;

        if manager.is_running() {
            was_running = true;
        } else if was_running {
            // The scripted end event went through; the session is done.
            break;
        }
    }

    script.await?;
    info!("demo session complete");
    Ok(())
}

async fn post(
    commands: &CommandSet,
    tx: &mpsc::Sender<ExperimentEvent>,
    name: &str,
    args: serde_json::Value,
) {
    match commands.interpret(name, &args) {
        Ok(event) => {
            let _ = tx.send(event).await;
        }
        Err(err) => tracing::warn!("command rejected: {}", err),
    }
}
