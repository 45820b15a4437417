//! Core session types and the pure transition function.
//!
//! This module contains the pure functional core of the session:
//! - The closed command vocabulary
//! - Immutable session state and its content digest
//! - Safety interlocks and the reducer that enforces them
//!
//! Nothing in this module performs I/O, reads a clock or draws randomness.

mod command;
mod digest;
mod interlock;
mod reducer;
mod state;
mod types;

pub use command::Command;
pub use digest::{Digest, DigestError};
pub use interlock::{
    arm_rejection, arming_checklist, arming_violations, can_arm, disarm_rejection,
    flight_mode_rejection, ArmingInterlock, MIN_ARMING_BATTERY_PCT,
};
pub use reducer::{reduce, FlightReducer, Outcome, Reducer};
pub use state::{SessionState, State};
pub use types::{
    ArmingState, Attitude, BatteryStatus, ConnectionConfig, FlightMode, Geofence, GpsFixType,
    GpsInfo, LinkStatus, Mission, Position, TelemetrySnapshot, Waypoint,
};
