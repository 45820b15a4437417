//! Safety interlocks for high-risk transitions.
//!
//! Arming is evaluated by [`arming_violations`], the single authoritative
//! ordering of arming preconditions. The reducer rejects with the first
//! violation; [`arming_checklist`] reports every violation at once using
//! stillwater's `Validation`, for pre-flight displays and authorization gates.

use super::state::SessionState;
use super::types::{FlightMode, GpsFixType, LinkStatus};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// Minimum battery state of charge, in percent, required to arm.
pub const MIN_ARMING_BATTERY_PCT: f64 = 20.0;

/// A failed arming precondition. The display text is the rejection rationale.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ArmingInterlock {
    #[error("arm rejected: not connected (status: {status})")]
    NotConnected { status: LinkStatus },

    #[error("arm rejected: already armed")]
    AlreadyArmed,

    #[error("arm rejected: GPS fix insufficient ({found}); fix_3d required")]
    GpsFixInsufficient { found: String },

    #[error("arm rejected: IMU not calibrated")]
    ImuNotCalibrated,

    #[error("arm rejected: compass not calibrated")]
    CompassNotCalibrated,

    #[error("arm rejected: battery {found}% below 20% threshold")]
    BatteryLow { found: String },

    #[error("arm rejected: no active geofence")]
    NoGeofence,
}

/// Every failing arming precondition, in evaluation order.
pub fn arming_violations(state: &SessionState) -> Vec<ArmingInterlock> {
    let mut violations = Vec::new();

    if state.link != LinkStatus::Connected {
        violations.push(ArmingInterlock::NotConnected { status: state.link });
    }
    if state.is_armed() {
        violations.push(ArmingInterlock::AlreadyArmed);
    }
    match state.gps {
        Some(gps) if gps.fix_type == GpsFixType::Fix3D => {}
        Some(gps) => violations.push(ArmingInterlock::GpsFixInsufficient {
            found: gps.fix_type.as_str().to_string(),
        }),
        None => violations.push(ArmingInterlock::GpsFixInsufficient {
            found: "none".to_string(),
        }),
    }
    if !state.imu_calibrated {
        violations.push(ArmingInterlock::ImuNotCalibrated);
    }
    if !state.compass_calibrated {
        violations.push(ArmingInterlock::CompassNotCalibrated);
    }
    match state.battery {
        Some(battery) if battery.percentage >= MIN_ARMING_BATTERY_PCT => {}
        Some(battery) => violations.push(ArmingInterlock::BatteryLow {
            found: battery.percentage.to_string(),
        }),
        None => violations.push(ArmingInterlock::BatteryLow {
            found: "unknown".to_string(),
        }),
    }
    if state.geofence.is_none() {
        violations.push(ArmingInterlock::NoGeofence);
    }

    violations
}

/// Accumulates all arming violations instead of stopping at the first.
///
/// # Example
///
/// ```rust
/// use gcs_session::core::{arming_checklist, SessionState};
/// use stillwater::validation::Validation;
///
/// match arming_checklist(&SessionState::initial()) {
///     Validation::Failure(violations) => assert_eq!(violations.len(), 6),
///     Validation::Success(_) => panic!("initial state must not be armable"),
/// }
/// ```
pub fn arming_checklist(state: &SessionState) -> Validation<(), NonEmptyVec<ArmingInterlock>> {
    let checks: Vec<Validation<(), NonEmptyVec<ArmingInterlock>>> = arming_violations(state)
        .into_iter()
        .map(Validation::fail)
        .collect();

    Validation::all_vec(checks).map(|_| ())
}

/// The first failing arming precondition, if any.
pub fn arm_rejection(state: &SessionState) -> Option<ArmingInterlock> {
    arming_violations(state).into_iter().next()
}

/// True when every arming precondition holds.
///
/// Callers that need to know whether the vehicle can arm must use this
/// rather than re-deriving the conditions.
pub fn can_arm(state: &SessionState) -> bool {
    arm_rejection(state).is_none()
}

/// Rationale for refusing a disarm, or `None` if disarming is safe.
pub fn disarm_rejection(state: &SessionState) -> Option<String> {
    if !state.is_armed() {
        return Some("disarm rejected: vehicle not armed".to_string());
    }
    if state.is_airborne() && state.flight_mode != FlightMode::Hovering {
        return Some(format!(
            "disarm rejected: cannot disarm while {} (unsafe in-flight disarm)",
            state.flight_mode
        ));
    }
    None
}

/// Rationale for refusing a mode change, or `None` if it is allowed.
///
/// `TakingOff` and `Landing` belong to the takeoff and land commands, both as
/// targets and as modes that cannot be interrupted.
pub fn flight_mode_rejection(mode: FlightMode, state: &SessionState) -> Option<String> {
    match mode {
        FlightMode::TakingOff => {
            return Some(
                "set_flight_mode rejected: use the takeoff command to enter taking_off".to_string(),
            )
        }
        FlightMode::Landing => {
            return Some(
                "set_flight_mode rejected: use the land command to enter landing".to_string(),
            )
        }
        _ => {}
    }
    match state.flight_mode {
        FlightMode::TakingOff => {
            Some("set_flight_mode rejected: cannot change mode during takeoff".to_string())
        }
        FlightMode::Landing => {
            Some("set_flight_mode rejected: cannot change mode during landing".to_string())
        }
        _ => None,
    }
}
