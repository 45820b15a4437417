//! Ground Control Session
//!
//! This example walks one vehicle session from power-on to takeoff.
//!
//! Key concepts:
//! - Every command goes through the orchestrator, accepted or not
//! - Interlocks reject unsafe commands with a rationale instead of an error
//! - The audit ledger verifies and replays to the live state
//! - A checkpoint restores the session elsewhere
//!
//! Run with: RUST_LOG=gcs_session=debug cargo run --example gcs_session

use chrono::Utc;
use gcs_session::core::{
    BatteryStatus, Command, ConnectionConfig, FlightMode, Geofence, GpsFixType, GpsInfo,
    LinkStatus, Mission, Position, State, TelemetrySnapshot, Waypoint,
};
use gcs_session::orchestrator::{
    Orchestrator, OrchestratorConfig, RandomIdGenerator, SessionError, SystemClock,
};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

const CONFIG: &str = r#"
broadcast_capacity = 32
ledger_format = "binary"
"#;

fn setup_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .try_init()
        .ok();
}

fn home() -> Position {
    Position {
        latitude: 47.397742,
        longitude: 8.545594,
        altitude_msl_m: 488.0,
    }
}

fn script() -> Vec<(&'static str, Command)> {
    let id = Uuid::new_v4;
    vec![
        ("operator-ui", Command::Arm { correlation_id: id() }),
        (
            "operator-ui",
            Command::Connect {
                config: ConnectionConfig {
                    host: "192.168.4.1".to_string(),
                    port: 14550,
                },
                correlation_id: id(),
            },
        ),
        (
            "telemetry",
            Command::LinkStatusChanged {
                status: LinkStatus::Connected,
                correlation_id: id(),
            },
        ),
        (
            "telemetry",
            Command::CalibrationUpdated {
                imu_calibrated: true,
                compass_calibrated: true,
                correlation_id: id(),
            },
        ),
        (
            "telemetry",
            Command::TelemetryReceived {
                data: TelemetrySnapshot {
                    position: Some(home()),
                    attitude: None,
                    battery: Some(BatteryStatus {
                        percentage: 87.0,
                        voltage_v: 16.4,
                        temperature_c: 22.5,
                    }),
                    gps: Some(GpsInfo {
                        fix_type: GpsFixType::Fix3D,
                        satellite_count: 15,
                    }),
                    timestamp: Utc::now(),
                },
                correlation_id: id(),
            },
        ),
        (
            "operator-ui",
            Command::LoadMission {
                mission: Mission {
                    id: id(),
                    name: "survey".to_string(),
                    waypoints: vec![Waypoint {
                        position: home(),
                        altitude_msl_m: 520.0,
                    }],
                },
                correlation_id: id(),
            },
        ),
        (
            "operator-ui",
            Command::SetGeofence {
                geofence: Geofence {
                    center: home(),
                    radius_m: 500.0,
                },
                correlation_id: id(),
            },
        ),
        ("operator-ui", Command::Arm { correlation_id: id() }),
        (
            "agent",
            Command::SetFlightMode {
                mode: FlightMode::TakingOff,
                correlation_id: id(),
            },
        ),
        (
            "operator-ui",
            Command::Takeoff {
                altitude_m: 25.0,
                correlation_id: id(),
            },
        ),
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    println!("=== Ground Control Session ===\n");

    let orchestrator = Orchestrator::with_config(
        OrchestratorConfig::from_toml_str(CONFIG)?,
        Arc::new(SystemClock),
        Arc::new(RandomIdGenerator),
    )?;

    let mut updates = orchestrator.subscribe().await;
    let watcher = tokio::spawn(async move {
        let mut seen = 0usize;
        while let Some(state) = updates.next().await {
            seen += 1;
            println!("  [observer] {}", state.name());
        }
        seen
    });

    for (source, command) in script() {
        let label = command.to_string();
        let outcome = orchestrator.dispatch(command, source).await?;
        let verdict = if outcome.applied { "accepted" } else { "REJECTED" };
        println!("{source:>12} {label:<40} {verdict}: {}", outcome.rationale);
    }

    let ledger = orchestrator.ledger().await;
    let verification = orchestrator.verify().await;
    let replay = orchestrator.replay(&ledger);
    println!("\nLedger: {} records, chain valid: {}", ledger.len(), verification.is_valid);
    println!(
        "Replay: succeeded={} final={}",
        replay.succeeded,
        replay.final_state.name()
    );

    let bytes = orchestrator.checkpoint().await?;
    println!(
        "Checkpoint: {} bytes ({:?})",
        bytes.len(),
        orchestrator.config().ledger_format
    );

    let restored = Orchestrator::restore(
        &bytes,
        orchestrator.config().clone(),
        Arc::new(SystemClock),
        Arc::new(RandomIdGenerator),
    )
    .map_err(|e: SessionError| format!("restore failed: {e}"))?;
    println!(
        "Restored session in mode {}",
        restored.current_state().await.flight_mode
    );

    drop(orchestrator);
    let seen = watcher.await?;
    println!("\nObserver received {seen} states");

    Ok(())
}
