//! Session state and the `State` trait.
//!
//! All state values are immutable snapshots. The reducer produces a fresh
//! value for every transition; nothing else in the crate hands out a state
//! that can be edited in place.

use super::digest::{Digest, DigestError};
use super::types::{
    ArmingState, Attitude, BatteryStatus, FlightMode, Geofence, GpsInfo, LinkStatus, Mission,
    Position, TelemetrySnapshot,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for values that can be reduced, audited and replayed.
///
/// # Required Traits
///
/// - `Clone`: outcomes hand back owned snapshots
/// - `PartialEq`: rejected transitions are checked for equality with their input
/// - `Debug`: states must be debuggable for diagnostics
/// - `Serialize` + `Deserialize`: the digest is taken over the serialized form
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Short label for logging.
    fn name(&self) -> &str;

    /// Content digest of the full state.
    ///
    /// Identical values always yield identical digests; any field change
    /// yields a different one.
    fn digest(&self) -> Result<Digest, DigestError> {
        Digest::of(self)
    }
}

/// Everything the ground station knows about the vehicle and session.
///
/// # Example
///
/// ```rust
/// use gcs_session::core::{ArmingState, FlightMode, LinkStatus, SessionState, State};
///
/// let state = SessionState::initial();
/// assert_eq!(state.link, LinkStatus::Disconnected);
/// assert_eq!(state.arming, ArmingState::Disarmed);
/// assert_eq!(state.flight_mode, FlightMode::Idle);
/// assert_eq!(state.name(), "disconnected/disarmed/idle");
/// ```
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SessionState {
    pub link: LinkStatus,
    /// Latest telemetry frame. `None` until the first frame after connecting.
    pub telemetry: Option<TelemetrySnapshot>,
    pub flight_mode: FlightMode,
    pub arming: ArmingState,
    pub position: Option<Position>,
    pub attitude: Option<Attitude>,
    pub battery: Option<BatteryStatus>,
    /// `None` means no GPS report at all, which is distinct from `NoFix`.
    pub gps: Option<GpsInfo>,
    pub imu_calibrated: bool,
    pub compass_calibrated: bool,
    pub mission: Option<Mission>,
    pub geofence: Option<Geofence>,
    /// Timestamp of the latest telemetry frame; the Unix epoch until one arrives.
    pub last_updated: DateTime<Utc>,
}

impl SessionState {
    /// The canonical starting state of every session.
    pub fn initial() -> Self {
        Self {
            link: LinkStatus::Disconnected,
            telemetry: None,
            flight_mode: FlightMode::Idle,
            arming: ArmingState::Disarmed,
            position: None,
            attitude: None,
            battery: None,
            gps: None,
            imu_calibrated: false,
            compass_calibrated: false,
            mission: None,
            geofence: None,
            last_updated: DateTime::UNIX_EPOCH,
        }
    }

    /// True in every mode where the vehicle may be off the ground.
    pub fn is_airborne(&self) -> bool {
        !matches!(self.flight_mode, FlightMode::Idle)
    }

    pub fn is_armed(&self) -> bool {
        self.arming == ArmingState::Armed
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}

impl State for SessionState {
    fn name(&self) -> &str {
        match (self.link, self.arming, self.flight_mode) {
            (LinkStatus::Disconnected, ArmingState::Disarmed, FlightMode::Idle) => {
                "disconnected/disarmed/idle"
            }
            (_, ArmingState::Disarmed, _) => self.link.as_str(),
            (_, ArmingState::Armed, mode) => mode.as_str(),
        }
    }
}
