//! The closed vocabulary of session commands.
//!
//! Every variant carries a caller-supplied `correlation_id` that links the
//! command to distributed traces and audit records. Commands never mint their
//! own ids; doing so would make replayed ledgers diverge from the original run.
//!
//! Origin attribution (operator UI, telemetry, agents) is not part of the
//! command. It is recorded alongside it in the audit ledger as a source id.

use super::types::{
    serialize_finite, ConnectionConfig, FlightMode, Geofence, LinkStatus, Mission,
    TelemetrySnapshot,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A single session input.
///
/// # Example
///
/// ```rust
/// use gcs_session::core::Command;
/// use uuid::Uuid;
///
/// let id = Uuid::from_u128(7);
/// let takeoff = Command::Takeoff { altitude_m: 10.0, correlation_id: id };
///
/// assert_eq!(takeoff.correlation_id(), id);
/// assert_eq!(takeoff.to_string(), "takeoff(10m)");
/// assert!(takeoff.is_high_risk());
/// ```
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Open the vehicle link.
    Connect {
        config: ConnectionConfig,
        correlation_id: Uuid,
    },
    /// Close the link and drop all flight data.
    Disconnect { correlation_id: Uuid },
    /// Link quality change reported by the transport.
    LinkStatusChanged {
        status: LinkStatus,
        correlation_id: Uuid,
    },
    TelemetryReceived {
        data: TelemetrySnapshot,
        correlation_id: Uuid,
    },
    CalibrationUpdated {
        imu_calibrated: bool,
        compass_calibrated: bool,
        correlation_id: Uuid,
    },
    Arm { correlation_id: Uuid },
    Disarm { correlation_id: Uuid },
    /// Climb to `altitude_m` above the takeoff point.
    Takeoff {
        #[serde(serialize_with = "serialize_finite")]
        altitude_m: f64,
        correlation_id: Uuid,
    },
    Land { correlation_id: Uuid },
    ReturnToLaunch { correlation_id: Uuid },
    SetFlightMode {
        mode: FlightMode,
        correlation_id: Uuid,
    },
    LoadMission {
        mission: Mission,
        correlation_id: Uuid,
    },
    StartMission { correlation_id: Uuid },
    PauseMission { correlation_id: Uuid },
    ClearMission { correlation_id: Uuid },
    SetGeofence {
        geofence: Geofence,
        correlation_id: Uuid,
    },
    /// Removing the fence expands the safety envelope.
    ClearGeofence { correlation_id: Uuid },
}

impl Command {
    /// The correlation id embedded in this command.
    pub fn correlation_id(&self) -> Uuid {
        match self {
            Self::Connect { correlation_id, .. }
            | Self::Disconnect { correlation_id }
            | Self::LinkStatusChanged { correlation_id, .. }
            | Self::TelemetryReceived { correlation_id, .. }
            | Self::CalibrationUpdated { correlation_id, .. }
            | Self::Arm { correlation_id }
            | Self::Disarm { correlation_id }
            | Self::Takeoff { correlation_id, .. }
            | Self::Land { correlation_id }
            | Self::ReturnToLaunch { correlation_id }
            | Self::SetFlightMode { correlation_id, .. }
            | Self::LoadMission { correlation_id, .. }
            | Self::StartMission { correlation_id }
            | Self::PauseMission { correlation_id }
            | Self::ClearMission { correlation_id }
            | Self::SetGeofence { correlation_id, .. }
            | Self::ClearGeofence { correlation_id } => *correlation_id,
        }
    }

    /// Commands an authorization gate must approve before they reach dispatch.
    pub fn is_high_risk(&self) -> bool {
        matches!(
            self,
            Self::Arm { .. } | Self::Takeoff { .. } | Self::ClearGeofence { .. }
        )
    }
}

/// Terse label used in log lines; the full payload lives in the serialized form.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect { .. } => write!(f, "connect"),
            Self::Disconnect { .. } => write!(f, "disconnect"),
            Self::LinkStatusChanged { status, .. } => write!(f, "link_status_changed({status})"),
            Self::TelemetryReceived { .. } => write!(f, "telemetry_received"),
            Self::CalibrationUpdated {
                imu_calibrated,
                compass_calibrated,
                ..
            } => write!(
                f,
                "calibration_updated(imu:{imu_calibrated}, compass:{compass_calibrated})"
            ),
            Self::Arm { .. } => write!(f, "arm"),
            Self::Disarm { .. } => write!(f, "disarm"),
            Self::Takeoff { altitude_m, .. } => write!(f, "takeoff({altitude_m}m)"),
            Self::Land { .. } => write!(f, "land"),
            Self::ReturnToLaunch { .. } => write!(f, "return_to_launch"),
            Self::SetFlightMode { mode, .. } => write!(f, "set_flight_mode({mode})"),
            Self::LoadMission { mission, .. } => write!(f, "load_mission({})", mission.name),
            Self::StartMission { .. } => write!(f, "start_mission"),
            Self::PauseMission { .. } => write!(f, "pause_mission"),
            Self::ClearMission { .. } => write!(f, "clear_mission"),
            Self::SetGeofence { geofence, .. } => {
                write!(f, "set_geofence(r:{}m)", geofence.radius_m)
            }
            Self::ClearGeofence { .. } => write!(f, "clear_geofence"),
        }
    }
}
