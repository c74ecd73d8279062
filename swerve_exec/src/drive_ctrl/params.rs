//! Parameters structure for DriveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::goal::PathConstraints;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for drive control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {

    // ---- OPERATOR INPUT ----

    /// Operator inputs with a magnitude below this are treated as zero.
    pub deadband: f64,

    /// Throttle curve knots, normalised input.
    pub throttle_curve_x: Vec<f64>,

    /// Throttle curve knots, output speed.
    ///
    /// Units: meters/second
    pub throttle_curve_y: Vec<f64>,

    /// Turn curve knots, normalised input.
    pub turn_curve_x: Vec<f64>,

    /// Turn curve knots, normalised output.
    pub turn_curve_y: Vec<f64>,

    /// Maximum linear speed of the robot, the throttle output is capped to this.
    ///
    /// Units: meters/second
    pub max_linear_speed_ms: f64,

    /// Start in field centric control if true, robot centric otherwise.
    pub field_centric: bool,

    // ---- ROTATE CONTROL ----

    pub rotate_kp: f64,
    pub rotate_ki: f64,
    pub rotate_kd: f64,

    /// Rotation rate at full rotate demand.
    ///
    /// Units: radians/second
    pub turn_scalar_rads: f64,

    /// Number of cycles the setpoint leads the heading by when rotation is released.
    pub lookahead_cycles: f64,

    /// Units: radians
    pub rotate_tolerance_rad: f64,

    // ---- AIM CONTROL ----

    pub aim_kp: f64,
    pub aim_kd: f64,

    /// Units: radians/second
    pub aim_max_velocity_rads: f64,

    /// Units: radians/second^2
    pub aim_max_acceleration_radss: f64,

    /// Units: radians
    pub aim_tolerance_rad: f64,

    /// The robot is only considered aimed when rotating slower than this.
    ///
    /// Units: radians/second
    pub aim_velocity_threshold_rads: f64,

    /// Offset added to every aim point.
    ///
    /// Units: meters
    pub aim_offset_m: [f64; 2],

    /// Proportion of the robot's velocity across the line of sight to lead the aim point by.
    pub aim_velocity_fudge: f64,

    // ---- SNAP ----

    /// Units: radians
    pub blue_amp_direction_rad: f64,

    /// Units: radians
    pub blue_source_direction_rad: f64,

    /// Units: radians
    pub red_amp_direction_rad: f64,

    /// Units: radians
    pub red_source_direction_rad: f64,

    /// Units: meters
    pub blue_source_point_m: [f64; 2],

    /// Units: meters
    pub red_source_point_m: [f64; 2],

    /// Within this distance of the source the snap direction is the source direction.
    ///
    /// Units: meters
    pub snap_source_radius_m: f64,

    // ---- ANTI-TIP ----

    /// Units: radians
    pub tip_threshold_rad: f64,

    /// Units: radians
    pub balanced_threshold_rad: f64,

    /// Fraction of the maximum linear speed used to drive out of a tip.
    pub anti_tip_speed_fraction: f64,

    /// Enter anti-tip automatically from any mode when a tip is detected.
    #[serde(default)]
    pub auto_anti_tip: bool,

    // ---- AUTONOMY ----

    pub path_constraints: PathConstraints,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_param_file_loads() {
        let params: Params =
            util::params::from_str(include_str!("../../../params/drive_ctrl.toml")).unwrap();

        assert_eq!(params.throttle_curve_x.len(), params.throttle_curve_y.len());
        assert_eq!(params.turn_curve_x.len(), params.turn_curve_y.len());
        assert!(!params.auto_anti_tip);
        assert!(params.path_constraints.validate().is_ok());
    }
}
