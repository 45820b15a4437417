//! End-to-end tests for dispatch, audit, broadcast and replay.

use chrono::{DateTime, Duration, Utc};
use gcs_session::audit::{AuditLedger, RecordEntry};
use gcs_session::checkpoint::LedgerFormat;
use gcs_session::core::{
    ArmingState, BatteryStatus, Command, ConnectionConfig, Digest, FlightMode, Geofence,
    GpsFixType, GpsInfo, LinkStatus, Position, SessionState, State, TelemetrySnapshot,
};
use gcs_session::orchestrator::{
    ManualClock, Orchestrator, OrchestratorConfig, ReplayFailure, SequentialIdGenerator,
    SessionError,
};
use std::sync::Arc;
use uuid::Uuid;

fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn session() -> (Orchestrator, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start()));
    let orchestrator =
        Orchestrator::new(clock.clone(), Arc::new(SequentialIdGenerator::new())).unwrap();
    (orchestrator, clock)
}

fn cid(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

fn connect(n: u128) -> Command {
    Command::Connect {
        config: ConnectionConfig {
            host: "192.168.4.1".to_string(),
            port: 14550,
        },
        correlation_id: cid(n),
    }
}

fn telemetry(battery_pct: f64, n: u128) -> Command {
    Command::TelemetryReceived {
        data: TelemetrySnapshot {
            position: Some(Position {
                latitude: 47.397742,
                longitude: 8.545594,
                altitude_msl_m: 488.0,
            }),
            attitude: None,
            battery: Some(BatteryStatus {
                percentage: battery_pct,
                voltage_v: 15.1,
                temperature_c: 24.0,
            }),
            gps: Some(GpsInfo {
                fix_type: GpsFixType::Fix3D,
                satellite_count: 14,
            }),
            timestamp: start() + Duration::seconds(30),
        },
        correlation_id: cid(n),
    }
}

/// Drive a fresh session to the point where only `arm` remains.
async fn ready_to_arm(orchestrator: &Orchestrator, battery_pct: f64) {
    let preflight = vec![
        connect(1),
        Command::LinkStatusChanged {
            status: LinkStatus::Connected,
            correlation_id: cid(2),
        },
        Command::CalibrationUpdated {
            imu_calibrated: true,
            compass_calibrated: true,
            correlation_id: cid(3),
        },
        telemetry(battery_pct, 4),
        Command::SetGeofence {
            geofence: Geofence {
                center: Position {
                    latitude: 47.397742,
                    longitude: 8.545594,
                    altitude_msl_m: 488.0,
                },
                radius_m: 500.0,
            },
            correlation_id: cid(5),
        },
    ];
    for command in preflight {
        let outcome = orchestrator.dispatch(command, "operator-ui").await.unwrap();
        assert!(outcome.applied, "preflight step rejected: {}", outcome.rationale);
    }
}

#[tokio::test]
async fn construction_records_genesis() {
    let (orchestrator, _) = session();
    let ledger = orchestrator.ledger().await;

    assert_eq!(ledger.len(), 1);
    let genesis = ledger.first().unwrap();
    assert!(genesis.previous_digest.is_none());
    assert_eq!(genesis.id, Uuid::from_u128(1));
    assert_eq!(genesis.timestamp, start());
    match &genesis.entry {
        RecordEntry::Initialization { state_digest } => {
            assert_eq!(state_digest, &SessionState::initial().digest().unwrap());
        }
        other => panic!("Expected genesis entry, got {other:?}"),
    }
}

#[tokio::test]
async fn connect_from_initial_state() {
    let (orchestrator, _) = session();
    let outcome = orchestrator.dispatch(connect(10), "operator-ui").await.unwrap();

    assert!(outcome.applied);
    assert_eq!(outcome.new_state.link, LinkStatus::Connecting);
    assert_eq!(orchestrator.current_state().await.link, LinkStatus::Connecting);
}

#[tokio::test]
async fn arm_on_initial_state_is_rejected() {
    let (orchestrator, _) = session();
    let outcome = orchestrator
        .dispatch(Command::Arm { correlation_id: cid(1) }, "agent")
        .await
        .unwrap();

    assert!(!outcome.applied);
    assert!(outcome.rationale.contains("not connected"));
    assert_eq!(outcome.new_state, SessionState::initial());

    let ledger = orchestrator.ledger().await;
    assert_eq!(ledger.len(), 2);
    assert!(!ledger.last().unwrap().is_accepted());
}

#[tokio::test]
async fn arm_at_exactly_twenty_percent_is_accepted() {
    let (orchestrator, _) = session();
    ready_to_arm(&orchestrator, 20.0).await;

    let outcome = orchestrator
        .dispatch(Command::Arm { correlation_id: cid(6) }, "operator-ui")
        .await
        .unwrap();
    assert!(outcome.applied, "{}", outcome.rationale);
    assert_eq!(outcome.new_state.arming, ArmingState::Armed);
}

#[tokio::test]
async fn arm_just_below_twenty_percent_is_rejected() {
    let (orchestrator, _) = session();
    ready_to_arm(&orchestrator, 19.9).await;

    let outcome = orchestrator
        .dispatch(Command::Arm { correlation_id: cid(6) }, "operator-ui")
        .await
        .unwrap();
    assert!(!outcome.applied);
    assert!(outcome.rationale.contains("battery"));
}

#[tokio::test]
async fn takeoff_to_zero_altitude_is_rejected() {
    let (orchestrator, _) = session();
    ready_to_arm(&orchestrator, 80.0).await;
    orchestrator
        .dispatch(Command::Arm { correlation_id: cid(6) }, "operator-ui")
        .await
        .unwrap();

    let outcome = orchestrator
        .dispatch(
            Command::Takeoff {
                altitude_m: 0.0,
                correlation_id: cid(7),
            },
            "operator-ui",
        )
        .await
        .unwrap();
    assert!(!outcome.applied);
    assert!(outcome.rationale.contains("positive"));

    let outcome = orchestrator
        .dispatch(
            Command::Takeoff {
                altitude_m: 10.0,
                correlation_id: cid(8),
            },
            "operator-ui",
        )
        .await
        .unwrap();
    assert!(outcome.applied);
    assert_eq!(outcome.new_state.flight_mode, FlightMode::TakingOff);
}

#[tokio::test]
async fn set_flight_mode_to_taking_off_points_at_takeoff() {
    let (orchestrator, _) = session();
    let outcome = orchestrator
        .dispatch(
            Command::SetFlightMode {
                mode: FlightMode::TakingOff,
                correlation_id: cid(1),
            },
            "agent",
        )
        .await
        .unwrap();

    assert!(!outcome.applied);
    assert!(outcome.rationale.contains("takeoff command"));
}

#[tokio::test]
async fn tampered_final_digest_fails_replay_but_not_verify() {
    let (orchestrator, _) = session();
    orchestrator.dispatch(connect(1), "operator-ui").await.unwrap();
    orchestrator
        .dispatch(
            Command::LinkStatusChanged {
                status: LinkStatus::Connected,
                correlation_id: cid(2),
            },
            "telemetry",
        )
        .await
        .unwrap();

    let mut records = orchestrator.ledger().await.into_records();
    let last = records.len() - 1;
    if let RecordEntry::Accepted { digest_after, .. } = &mut records[last].entry {
        *digest_after = Digest::from_hex("0".repeat(64));
    }
    let tampered = AuditLedger::from_records(records);

    assert!(tampered.verify().is_valid);
    let result = orchestrator.replay(&tampered);
    assert!(!result.succeeded);
    assert!(matches!(
        result.failure,
        Some(ReplayFailure::DigestMismatch { .. })
    ));
    assert!(result.reason().unwrap().contains("mismatch"));
}

#[tokio::test]
async fn tampered_middle_record_breaks_the_chain() {
    let (orchestrator, _) = session();
    for n in 0..3 {
        orchestrator
            .dispatch(Command::Arm { correlation_id: cid(n) }, "agent")
            .await
            .unwrap();
    }

    let mut records = orchestrator.ledger().await.into_records();
    if let RecordEntry::Rejected { state_digest, .. } = &mut records[1].entry {
        *state_digest = Digest::from_hex("f".repeat(64));
    }
    let tampered = AuditLedger::from_records(records);

    let verification = tampered.verify();
    assert_eq!(verification.broken_at_index, Some(2));

    let result = orchestrator.replay(&tampered);
    assert!(!result.succeeded);
    assert_eq!(result.final_state, SessionState::initial());
    assert!(matches!(
        result.failure,
        Some(ReplayFailure::ChainIntegrity { index: 2, .. })
    ));
}

#[tokio::test]
async fn records_use_injected_clock_and_ids() {
    let (orchestrator, clock) = session();
    clock.advance(Duration::seconds(5));
    orchestrator.dispatch(connect(1), "operator-ui").await.unwrap();
    clock.advance(Duration::seconds(5));
    orchestrator
        .dispatch(Command::Arm { correlation_id: cid(2) }, "agent")
        .await
        .unwrap();

    let ledger = orchestrator.ledger().await;
    let records = ledger.records();
    assert_eq!(records[1].timestamp, start() + Duration::seconds(5));
    assert_eq!(records[2].timestamp, start() + Duration::seconds(10));
    assert_eq!(records[1].id, Uuid::from_u128(2));
    assert_eq!(records[2].id, Uuid::from_u128(3));
    assert_eq!(records[1].source_id(), Some("operator-ui"));
    assert_eq!(records[2].source_id(), Some("agent"));
    assert_eq!(records[2].command().unwrap().correlation_id(), cid(2));
}

#[tokio::test]
async fn identical_runs_produce_identical_ledgers() {
    let run = || async {
        let (orchestrator, clock) = session();
        for n in 0..4 {
            clock.advance(Duration::milliseconds(250));
            orchestrator.dispatch(connect(n), "operator-ui").await.unwrap();
        }
        orchestrator.ledger().await
    };

    let first = run().await;
    let second = run().await;
    assert_eq!(first, second);
    assert_eq!(first.head_digest().unwrap(), second.head_digest().unwrap());
}

#[tokio::test]
async fn replay_skips_rejected_commands() {
    let (orchestrator, _) = session();
    orchestrator
        .dispatch(Command::Arm { correlation_id: cid(1) }, "agent")
        .await
        .unwrap();
    orchestrator.dispatch(connect(2), "operator-ui").await.unwrap();
    orchestrator.dispatch(connect(3), "operator-ui").await.unwrap();

    let ledger = orchestrator.ledger().await;
    assert_eq!(ledger.accepted_commands().count(), 1);

    let result = orchestrator.replay_current().await;
    assert!(result.succeeded);
    assert_eq!(result.final_state, orchestrator.current_state().await);
}

#[tokio::test]
async fn ledger_snapshot_is_detached() {
    let (orchestrator, _) = session();
    let snapshot = orchestrator.ledger().await;
    orchestrator.dispatch(connect(1), "operator-ui").await.unwrap();

    assert_eq!(snapshot.len(), 1);
    assert_eq!(orchestrator.ledger().await.len(), 2);
    assert!(orchestrator.verify().await.is_valid);
}

#[tokio::test]
async fn subscriber_sees_current_state_then_every_dispatch() {
    let (orchestrator, _) = session();
    orchestrator.dispatch(connect(1), "operator-ui").await.unwrap();

    let mut updates = orchestrator.subscribe().await;
    assert_eq!(updates.next().await.unwrap().link, LinkStatus::Connecting);

    let rejected = orchestrator
        .dispatch(Command::Arm { correlation_id: cid(2) }, "agent")
        .await
        .unwrap();
    assert!(!rejected.applied);
    orchestrator
        .dispatch(
            Command::LinkStatusChanged {
                status: LinkStatus::Connected,
                correlation_id: cid(3),
            },
            "telemetry",
        )
        .await
        .unwrap();

    assert_eq!(updates.next().await.unwrap().link, LinkStatus::Connecting);
    assert_eq!(updates.next().await.unwrap().link, LinkStatus::Connected);
    assert!(updates.try_next().is_none());
}

#[tokio::test]
async fn lagging_subscriber_skips_to_newer_states() {
    let config = OrchestratorConfig {
        broadcast_capacity: 1,
        ..OrchestratorConfig::default()
    };
    let orchestrator = Orchestrator::with_config(
        config,
        Arc::new(ManualClock::new(start())),
        Arc::new(SequentialIdGenerator::new()),
    )
    .unwrap();

    assert_eq!(orchestrator.config().broadcast_capacity, 1);

    let mut updates = orchestrator.subscribe().await;
    orchestrator.dispatch(connect(1), "operator-ui").await.unwrap();
    for (n, status) in [LinkStatus::Connected, LinkStatus::Lost].into_iter().enumerate() {
        orchestrator
            .dispatch(
                Command::LinkStatusChanged {
                    status,
                    correlation_id: cid(n as u128 + 2),
                },
                "telemetry",
            )
            .await
            .unwrap();
    }

    assert_eq!(updates.next().await.unwrap(), SessionState::initial());
    assert_eq!(updates.next().await.unwrap().link, LinkStatus::Lost);
}

#[tokio::test]
async fn subscription_ends_with_the_orchestrator() {
    let (orchestrator, _) = session();
    let mut updates = orchestrator.subscribe().await;
    drop(orchestrator);

    assert_eq!(updates.next().await.unwrap(), SessionState::initial());
    assert!(updates.next().await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_dispatch_is_totally_ordered() {
    let (orchestrator, _) = session();
    let orchestrator = Arc::new(orchestrator);
    let mut updates = orchestrator.subscribe().await;

    let statuses = [
        LinkStatus::Connecting,
        LinkStatus::Connected,
        LinkStatus::Lost,
        LinkStatus::Disconnected,
    ];
    let mut handles = Vec::new();
    for n in 0..32u128 {
        let orchestrator = Arc::clone(&orchestrator);
        let status = statuses[(n % 4) as usize];
        handles.push(tokio::spawn(async move {
            orchestrator
                .dispatch(
                    Command::LinkStatusChanged {
                        status,
                        correlation_id: cid(n),
                    },
                    format!("producer-{}", n % 3),
                )
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().applied);
    }

    let ledger = orchestrator.ledger().await;
    assert_eq!(ledger.len(), 33);
    assert!(ledger.verify().is_valid);

    let mut seen: Vec<Uuid> = ledger
        .accepted_commands()
        .map(|(command, _)| command.correlation_id())
        .collect();
    seen.sort();
    assert_eq!(seen, (0..32u128).map(cid).collect::<Vec<_>>());

    // Broadcast order matches ledger order.
    for record in ledger.records() {
        let state = updates.next().await.unwrap();
        assert_eq!(&state.digest().unwrap(), record.post_state_digest());
    }

    let result = orchestrator.replay(&ledger);
    assert!(result.succeeded);
    assert_eq!(result.final_state, orchestrator.current_state().await);
}

#[tokio::test]
async fn checkpoint_restores_the_session() {
    for format in [LedgerFormat::Json, LedgerFormat::Binary] {
        let config = OrchestratorConfig {
            ledger_format: format,
            ..OrchestratorConfig::default()
        };
        let clock = Arc::new(ManualClock::new(start()));
        let orchestrator = Orchestrator::with_config(
            config.clone(),
            clock.clone(),
            Arc::new(SequentialIdGenerator::new()),
        )
        .unwrap();
        ready_to_arm(&orchestrator, 55.5).await;
        let bytes = orchestrator.checkpoint().await.unwrap();

        let restored = Orchestrator::restore(
            &bytes,
            config,
            clock,
            Arc::new(SequentialIdGenerator::starting_at(1_000)),
        )
        .unwrap();
        assert_eq!(restored.current_state().await, orchestrator.current_state().await);
        assert_eq!(restored.ledger().await, orchestrator.ledger().await);

        let outcome = restored
            .dispatch(Command::Arm { correlation_id: cid(6) }, "operator-ui")
            .await
            .unwrap();
        assert!(outcome.applied, "{}", outcome.rationale);

        let ledger = restored.ledger().await;
        assert_eq!(ledger.last().unwrap().id, Uuid::from_u128(1_000));
        assert!(ledger.verify().is_valid);
        assert!(restored.replay_current().await.succeeded);
    }
}

#[tokio::test]
async fn non_finite_values_are_refused_before_commit() {
    let (orchestrator, _) = session();
    orchestrator.dispatch(connect(1), "operator-ui").await.unwrap();
    let ledger_before = orchestrator.ledger().await;
    let state_before = orchestrator.current_state().await;

    let nan_takeoff = Command::Takeoff {
        altitude_m: f64::NAN,
        correlation_id: cid(2),
    };
    let result = orchestrator.dispatch(nan_takeoff, "agent").await;
    assert!(matches!(result, Err(SessionError::Digest(_))));

    let inf_battery = telemetry(f64::INFINITY, 3);
    let result = orchestrator.dispatch(inf_battery, "telemetry").await;
    assert!(matches!(result, Err(SessionError::Digest(_))));

    assert_eq!(orchestrator.ledger().await, ledger_before);
    assert_eq!(orchestrator.current_state().await, state_before);

    let bytes = orchestrator.checkpoint().await.unwrap();
    let restored = Orchestrator::restore(
        &bytes,
        orchestrator.config().clone(),
        Arc::new(ManualClock::new(start())),
        Arc::new(SequentialIdGenerator::starting_at(500)),
    )
    .unwrap();
    assert_eq!(restored.current_state().await, state_before);

    let outcome = restored
        .dispatch(
            Command::LinkStatusChanged {
                status: LinkStatus::Connected,
                correlation_id: cid(4),
            },
            "telemetry",
        )
        .await
        .unwrap();
    assert!(outcome.applied);
    assert!(restored.verify().await.is_valid);
}

#[tokio::test]
async fn resume_refuses_a_ledger_that_does_not_replay() {
    let (orchestrator, _) = session();
    orchestrator.dispatch(connect(1), "operator-ui").await.unwrap();

    let mut records = orchestrator.ledger().await.into_records();
    if let RecordEntry::Accepted { digest_after, .. } = &mut records[1].entry {
        *digest_after = Digest::from_hex("1".repeat(64));
    }

    let result = Orchestrator::resume(
        AuditLedger::from_records(records),
        OrchestratorConfig::default(),
        Arc::new(ManualClock::new(start())),
        Arc::new(SequentialIdGenerator::new()),
    );
    assert!(matches!(
        result,
        Err(SessionError::Resume(ReplayFailure::DigestMismatch { .. }))
    ));
}

#[tokio::test]
async fn resume_from_empty_ledger_starts_fresh() {
    let orchestrator = Orchestrator::resume(
        AuditLedger::new(),
        OrchestratorConfig::default(),
        Arc::new(ManualClock::new(start())),
        Arc::new(SequentialIdGenerator::new()),
    )
    .unwrap();

    assert_eq!(orchestrator.ledger().await.len(), 1);
    assert_eq!(orchestrator.current_state().await, SessionState::initial());
}
