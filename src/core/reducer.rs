//! The pure transition function.
//!
//! `reduce` is total over every `(SessionState, Command)` pair. It performs no
//! I/O, reads no clock and draws no randomness, so the same input always
//! yields the same `Outcome`. Invalid or out-of-sequence commands become
//! rejections that hand the input state back untouched.

use super::command::Command;
use super::interlock::{arm_rejection, disarm_rejection, flight_mode_rejection};
use super::state::{SessionState, State};
use super::types::{ArmingState, FlightMode, LinkStatus};

/// Verdict of a single transition.
///
/// A rejected outcome always carries the input state unchanged.
#[derive(Clone, PartialEq, Debug)]
pub struct Outcome<S: State> {
    pub new_state: S,
    pub applied: bool,
    pub rationale: String,
}

impl<S: State> Outcome<S> {
    pub fn accepted(new_state: S, rationale: impl Into<String>) -> Self {
        Self {
            new_state,
            applied: true,
            rationale: rationale.into(),
        }
    }

    pub fn rejected(state: S, rationale: impl Into<String>) -> Self {
        Self {
            new_state: state,
            applied: false,
            rationale: rationale.into(),
        }
    }
}

/// A pure transition function over a state and command vocabulary.
pub trait Reducer: Send + Sync {
    type State: State;
    type Command;

    fn reduce(&self, state: &Self::State, command: &Self::Command) -> Outcome<Self::State>;
}

/// The session reducer.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlightReducer;

impl Reducer for FlightReducer {
    type State = SessionState;
    type Command = Command;

    fn reduce(&self, state: &SessionState, command: &Command) -> Outcome<SessionState> {
        reduce(state, command)
    }
}

/// Apply `command` to `state`.
///
/// # Example
///
/// ```rust
/// use gcs_session::core::{reduce, Command, ConnectionConfig, LinkStatus, SessionState};
/// use uuid::Uuid;
///
/// let connect = Command::Connect {
///     config: ConnectionConfig { host: "10.0.0.1".into(), port: 14550 },
///     correlation_id: Uuid::from_u128(1),
/// };
/// let outcome = reduce(&SessionState::initial(), &connect);
///
/// assert!(outcome.applied);
/// assert_eq!(outcome.new_state.link, LinkStatus::Connecting);
/// ```
pub fn reduce(state: &SessionState, command: &Command) -> Outcome<SessionState> {
    let reject = |rationale: String| Outcome::rejected(state.clone(), rationale);

    match command {
        Command::Connect { config, .. } => {
            if !matches!(state.link, LinkStatus::Disconnected | LinkStatus::Lost) {
                return reject(format!("connect rejected: already {}", state.link));
            }
            Outcome::accepted(
                SessionState {
                    link: LinkStatus::Connecting,
                    ..state.clone()
                },
                format!("connecting to {}:{}", config.host, config.port),
            )
        }

        Command::Disconnect { .. } => {
            if state.link == LinkStatus::Disconnected {
                return reject("disconnect rejected: already disconnected".to_string());
            }
            Outcome::accepted(
                SessionState {
                    link: LinkStatus::Disconnected,
                    telemetry: None,
                    position: None,
                    attitude: None,
                    battery: None,
                    gps: None,
                    ..state.clone()
                },
                "disconnected; flight data cleared",
            )
        }

        Command::LinkStatusChanged { status, .. } => Outcome::accepted(
            SessionState {
                link: *status,
                ..state.clone()
            },
            format!("link status -> {status}"),
        ),

        Command::TelemetryReceived { data, .. } => Outcome::accepted(
            SessionState {
                position: data.position,
                attitude: data.attitude,
                battery: data.battery,
                gps: data.gps,
                last_updated: data.timestamp,
                telemetry: Some(data.clone()),
                ..state.clone()
            },
            "telemetry updated",
        ),

        Command::CalibrationUpdated {
            imu_calibrated,
            compass_calibrated,
            ..
        } => Outcome::accepted(
            SessionState {
                imu_calibrated: *imu_calibrated,
                compass_calibrated: *compass_calibrated,
                ..state.clone()
            },
            format!("calibration updated (imu:{imu_calibrated}, compass:{compass_calibrated})"),
        ),

        Command::Arm { .. } => {
            if let Some(interlock) = arm_rejection(state) {
                return reject(interlock.to_string());
            }
            Outcome::accepted(
                SessionState {
                    arming: ArmingState::Armed,
                    ..state.clone()
                },
                "armed; all preconditions satisfied",
            )
        }

        Command::Disarm { .. } => {
            if let Some(rationale) = disarm_rejection(state) {
                return reject(rationale);
            }
            Outcome::accepted(
                SessionState {
                    arming: ArmingState::Disarmed,
                    ..state.clone()
                },
                "disarmed",
            )
        }

        Command::Takeoff { altitude_m, .. } => {
            if !state.is_armed() {
                return reject("takeoff rejected: vehicle not armed".to_string());
            }
            if state.is_airborne() {
                return reject(format!(
                    "takeoff rejected: flight mode is {}, expected idle",
                    state.flight_mode
                ));
            }
            // NaN fails this comparison as well.
            if !(*altitude_m > 0.0) {
                return reject(format!(
                    "takeoff rejected: altitude must be positive (got {altitude_m})"
                ));
            }
            Outcome::accepted(
                SessionState {
                    flight_mode: FlightMode::TakingOff,
                    ..state.clone()
                },
                format!("taking off to {altitude_m}m"),
            )
        }

        Command::Land { .. } => {
            if !matches!(state.flight_mode, FlightMode::Flying | FlightMode::Hovering) {
                return reject(format!(
                    "land rejected: flight mode is {}, expected flying or hovering",
                    state.flight_mode
                ));
            }
            Outcome::accepted(
                SessionState {
                    flight_mode: FlightMode::Landing,
                    ..state.clone()
                },
                "landing at current position",
            )
        }

        Command::ReturnToLaunch { .. } => {
            if !state.is_armed() {
                return reject("return_to_launch rejected: vehicle not armed".to_string());
            }
            Outcome::accepted(
                SessionState {
                    flight_mode: FlightMode::ReturningToLaunch,
                    ..state.clone()
                },
                "returning to launch",
            )
        }

        Command::SetFlightMode { mode, .. } => {
            if let Some(rationale) = flight_mode_rejection(*mode, state) {
                return reject(rationale);
            }
            Outcome::accepted(
                SessionState {
                    flight_mode: *mode,
                    ..state.clone()
                },
                format!("flight mode -> {mode}"),
            )
        }

        Command::LoadMission { mission, .. } => {
            // Only checks that a fence exists; waypoint containment belongs to
            // a spatial validator outside this crate.
            if state.geofence.is_none() {
                return reject(
                    "load_mission rejected: no active geofence; set a geofence before loading a mission"
                        .to_string(),
                );
            }
            Outcome::accepted(
                SessionState {
                    mission: Some(mission.clone()),
                    ..state.clone()
                },
                format!(
                    "mission '{}' loaded ({} waypoints)",
                    mission.name,
                    mission.waypoints.len()
                ),
            )
        }

        Command::StartMission { .. } => {
            if !state.is_armed() {
                return reject("start_mission rejected: vehicle not armed".to_string());
            }
            if state.mission.is_none() {
                return reject("start_mission rejected: no mission loaded".to_string());
            }
            Outcome::accepted(
                SessionState {
                    flight_mode: FlightMode::Flying,
                    ..state.clone()
                },
                "mission execution started",
            )
        }

        Command::PauseMission { .. } => {
            if state.mission.is_none() {
                return reject("pause_mission rejected: no active mission".to_string());
            }
            if state.flight_mode != FlightMode::Flying {
                return reject(format!(
                    "pause_mission rejected: flight mode is {}, expected flying",
                    state.flight_mode
                ));
            }
            Outcome::accepted(
                SessionState {
                    flight_mode: FlightMode::Hovering,
                    ..state.clone()
                },
                "mission paused; hovering at current position",
            )
        }

        Command::ClearMission { .. } => {
            if state.mission.is_none() {
                return reject("clear_mission rejected: no mission to clear".to_string());
            }
            Outcome::accepted(
                SessionState {
                    mission: None,
                    ..state.clone()
                },
                "mission cleared",
            )
        }

        Command::SetGeofence { geofence, .. } => {
            if !(geofence.radius_m > 0.0) {
                return reject(format!(
                    "set_geofence rejected: radius must be positive (got {})",
                    geofence.radius_m
                ));
            }
            Outcome::accepted(
                SessionState {
                    geofence: Some(*geofence),
                    ..state.clone()
                },
                format!("geofence set (r:{}m)", geofence.radius_m),
            )
        }

        Command::ClearGeofence { .. } => {
            if state.geofence.is_none() {
                return reject("clear_geofence rejected: no active geofence to clear".to_string());
            }
            Outcome::accepted(
                SessionState {
                    geofence: None,
                    ..state.clone()
                },
                "geofence cleared; spatial safety envelope expanded",
            )
        }
    }
}
