//! # Swerve Executable Parameters
//!
//! This module provide parameters for the swerve executable and the simulated equipment it drives.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use comms_if::alliance::Alliance;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwerveExecParams {
    /// Target period of one cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Number of samples in the IMU velocity median filter.
    pub imu_filter_taps: usize,

    /// Alliance the robot plays for, if known.
    pub alliance: Option<Alliance>,

    /// Pose the simulated robot starts in, `[x, y, heading]`.
    ///
    /// Units: meters, meters, radians
    pub initial_pose: [f64; 3],

    // ---- SIMULATED VISION ----

    /// Units: seconds
    pub vision_period_s: f64,

    /// Units: meters, meters, radians
    pub vision_std_dev: [f64; 3],

    pub vision_seed: u32,

    // ---- PATH FOLLOWING ----

    /// Units: meters
    pub follower_position_tolerance_m: f64,

    /// Units: radians
    pub follower_heading_tolerance_rad: f64,

    /// Units: 1/seconds
    pub follower_heading_kp: f64,

    /// Name of the telemetry archive within the session.
    pub telemetry_file: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_param_file_loads() {
        let params: SwerveExecParams =
            util::params::from_str(include_str!("../../params/swerve_exec.toml")).unwrap();

        assert_eq!(params.cycle_period_s, 0.02);
        assert_eq!(params.alliance, Some(Alliance::Blue));
        assert!(params.imu_filter_taps > 0);
    }
}
