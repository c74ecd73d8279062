//! # Inertial Measurement Unit Equipment Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Data sampled from the IMU.
///
/// Angles follow the right hand rule: yaw is positive anticlockwise when viewed from above, and is
/// continuous (not wrapped) so that it can be differenced between cycles.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq)]
pub struct ImuData {
    /// Yaw angle.
    ///
    /// Units: radians
    pub yaw_rad: f64,

    /// Pitch angle, positive nose up.
    ///
    /// Units: radians
    pub pitch_rad: f64,

    /// Roll angle, positive left side up.
    ///
    /// Units: radians
    pub roll_rad: f64,

    /// Yaw rate.
    ///
    /// Units: radians/second
    pub yaw_rate_rads: f64,

    /// Integrated linear velocity in the robot frame, `[x, y]`.
    ///
    /// Units: meters/second
    pub velocity_ms: [f64; 2],
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Driver for the robot's heading sensor.
pub trait Imu {
    /// Sample the sensor.
    fn sample(&self) -> ImuData;
}
