//! # Rotate controller
//!
//! Heading control for operator driving. While the operator commands rotation the shaped rotate
//! demand is passed straight through as a rate, and the hold setpoint follows a few cycles ahead of
//! the current heading at the current rate. When the operator lets go the PID holds that setpoint,
//! so the robot settles without snapping back.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::{InputMap, Pid};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Heading hold and rotation controller.
///
/// Works on the continuous (unwrapped) gyro yaw so that the setpoint can be driven through any
/// number of turns.
#[derive(Debug, Clone, Serialize)]
pub struct RotateController {
    turn_map: InputMap,

    pid: Pid,

    /// Units: radians/second
    turn_scalar_rads: f64,

    lookahead_cycles: f64,

    is_rotating: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RotateController {
    pub fn new(turn_map: InputMap, pid: Pid, turn_scalar_rads: f64, lookahead_cycles: f64) -> Self {
        Self {
            turn_map,
            pid,
            turn_scalar_rads,
            lookahead_cycles,
            is_rotating: false,
        }
    }

    /// Compute the rotation rate for the operator's rotate demand.
    ///
    /// Units: radians/second
    pub fn calculate(&mut self, yaw_rad: f64, yaw_rate_rads: f64, rotate_request: f64) -> f64 {
        let lead_rad = yaw_rate_rads * self.lookahead_cycles * self.pid.period_s();

        if rotate_request.abs() >= self.turn_map.deadband() && rotate_request.is_finite() {
            self.pid.set_setpoint(yaw_rad + lead_rad);
            self.pid.reset();
            self.is_rotating = true;

            return self.turn_map.lookup(rotate_request) * self.turn_scalar_rads;
        }

        if self.is_rotating {
            self.pid.set_setpoint(yaw_rad + lead_rad);
            self.is_rotating = false;
        }

        self.pid.calculate(yaw_rad)
    }

    /// Drive the heading to the given yaw.
    ///
    /// Units: radians/second
    pub fn calculate_to(&mut self, yaw_rad: f64, target_yaw_rad: f64) -> f64 {
        self.is_rotating = false;
        self.pid.calculate_to(yaw_rad, target_yaw_rad)
    }

    /// Hold the current yaw, clearing any accumulated state.
    pub fn reset(&mut self, yaw_rad: f64) {
        self.pid.set_setpoint(yaw_rad);
        self.pid.reset();
        self.is_rotating = false;
    }

    /// Units: radians
    pub fn setpoint_rad(&self) -> f64 {
        self.pid.setpoint()
    }

    pub fn is_rotating(&self) -> bool {
        self.is_rotating
    }

    pub fn at_setpoint(&self) -> bool {
        self.pid.at_setpoint()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn controller() -> RotateController {
        let turn_map = InputMap::new(&[0.0, 1.0], &[0.0, 1.0], 0.1, 1.0).unwrap();
        RotateController::new(turn_map, Pid::new(30.0, 0.0, 0.0, 0.02), 0.5, 3.0)
    }

    #[test]
    fn test_hold_heading() {
        let mut rot = controller();
        rot.reset(1.0);

        // Knocked off the heading, pushes back
        let out = rot.calculate(1.1, 0.0, 0.0);
        assert_abs_diff_eq!(out, -3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rot.setpoint_rad(), 1.0);
    }

    #[test]
    fn test_rotate_and_release() {
        let mut rot = controller();
        rot.reset(0.0);

        // Half stick is rescaled past the deadband before the curve
        let out = rot.calculate(0.0, 0.0, 0.55);
        assert!(rot.is_rotating());
        assert_abs_diff_eq!(out, 0.25, epsilon = 1e-12);

        // Negative demand turns the other way
        let out = rot.calculate(0.0, 0.0, -1.0);
        assert_abs_diff_eq!(out, -0.5, epsilon = 1e-12);

        // The hold setpoint trails the heading while rotating
        rot.calculate(1.0, 2.0, 1.0);
        assert_abs_diff_eq!(rot.setpoint_rad(), 1.12, epsilon = 1e-12);

        // Release leads the current heading by the lookahead
        rot.calculate(2.0, 1.0, 0.0);
        assert!(!rot.is_rotating());
        assert_abs_diff_eq!(rot.setpoint_rad(), 2.06, epsilon = 1e-12);
    }

    #[test]
    fn test_held_stick_does_not_wind_up() {
        let turn_map = InputMap::new(&[0.0, 1.0], &[0.0, 1.0], 0.1, 1.0).unwrap();
        let mut rot = RotateController::new(
            turn_map,
            Pid::new(30.0, 0.0, 0.3, 0.02),
            std::f64::consts::FRAC_PI_6,
            3.0,
        );
        rot.reset(0.0);

        // Robot pinned in place while the operator holds full stick
        let first = rot.calculate(0.0, 0.0, 1.0);
        for _ in 0..50 {
            let out = rot.calculate(0.0, 0.0, 1.0);
            assert_abs_diff_eq!(out, first, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(first, std::f64::consts::FRAC_PI_6, epsilon = 1e-12);
        assert_abs_diff_eq!(rot.setpoint_rad(), 0.0, epsilon = 1e-12);

        // On release it holds where it is rather than chasing a wound up target
        let out = rot.calculate(0.0, 0.0, 0.0);
        assert_abs_diff_eq!(out, 0.0, epsilon = 1e-12);
    }
}
