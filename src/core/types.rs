//! Value types carried by session state and commands.
//!
//! Optional fields on these types reflect real sensor availability: a
//! missing GPS block indoors is a valid, meaningful reading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// GCS to vehicle link state.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Disconnected,
    Connecting,
    Connected,
    /// Link was up and dropped without an explicit disconnect.
    Lost,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Lost => "lost",
        }
    }
}

/// Motor arming state.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmingState {
    Disarmed,
    Armed,
}

impl ArmingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disarmed => "disarmed",
            Self::Armed => "armed",
        }
    }
}

/// Active flight control mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightMode {
    /// On the ground.
    Idle,
    /// Climbing to the altitude requested by a takeoff command.
    TakingOff,
    Flying,
    Hovering,
    Landing,
    ReturningToLaunch,
    /// Direct RC input; autonomous authority suspended.
    Manual,
}

impl FlightMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::TakingOff => "taking_off",
            Self::Flying => "flying",
            Self::Hovering => "hovering",
            Self::Landing => "landing",
            Self::ReturningToLaunch => "returning_to_launch",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for FlightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ArmingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GPS fix quality.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpsFixType {
    NoFix,
    #[serde(rename = "fix_2d")]
    Fix2D,
    /// Full three-dimensional fix. Required for arming.
    #[serde(rename = "fix_3d")]
    Fix3D,
}

impl GpsFixType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoFix => "no_fix",
            Self::Fix2D => "fix_2d",
            Self::Fix3D => "fix_3d",
        }
    }
}

/// Serializes an `f64`, refusing NaN and infinities, which JSON cannot carry.
pub(crate) fn serialize_finite<S: Serializer>(
    value: &f64,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    if !value.is_finite() {
        return Err(serde::ser::Error::custom(format!(
            "non-finite value {value} cannot be recorded"
        )));
    }
    serializer.serialize_f64(*value)
}

/// GPS receiver status.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct GpsInfo {
    pub fix_type: GpsFixType,
    pub satellite_count: u32,
}

/// WGS-84 position.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Position {
    /// Decimal degrees, positive north.
    #[serde(serialize_with = "serialize_finite")]
    pub latitude: f64,
    /// Decimal degrees, positive east.
    #[serde(serialize_with = "serialize_finite")]
    pub longitude: f64,
    /// Metres above mean sea level.
    #[serde(serialize_with = "serialize_finite")]
    pub altitude_msl_m: f64,
}

/// Vehicle orientation as Euler angles, in degrees.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Attitude {
    #[serde(serialize_with = "serialize_finite")]
    pub roll_deg: f64,
    #[serde(serialize_with = "serialize_finite")]
    pub pitch_deg: f64,
    #[serde(serialize_with = "serialize_finite")]
    pub yaw_deg: f64,
}

/// Battery pack status.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct BatteryStatus {
    /// State of charge, 0.0 to 100.0.
    #[serde(serialize_with = "serialize_finite")]
    pub percentage: f64,
    #[serde(serialize_with = "serialize_finite")]
    pub voltage_v: f64,
    #[serde(serialize_with = "serialize_finite")]
    pub temperature_c: f64,
}

/// One aggregated sensor frame from the vehicle link.
///
/// `timestamp` is stamped by the telemetry source, never by the reducer.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub position: Option<Position>,
    pub attitude: Option<Attitude>,
    pub battery: Option<BatteryStatus>,
    pub gps: Option<GpsInfo>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Waypoint {
    pub position: Position,
    #[serde(serialize_with = "serialize_finite")]
    pub altitude_msl_m: f64,
}

/// A named waypoint sequence.
///
/// The id is supplied by the caller; nothing in this crate mints one.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Mission {
    pub id: Uuid,
    pub name: String,
    pub waypoints: Vec<Waypoint>,
}

/// Circular geographic boundary.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Geofence {
    pub center: Position,
    #[serde(serialize_with = "serialize_finite")]
    pub radius_m: f64,
}

/// Parameters for reaching the vehicle link endpoint.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
}
