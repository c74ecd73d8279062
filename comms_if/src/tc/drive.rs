//! # Drive telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Operator stick demands for one control cycle.
///
/// All axes are normalised to `[-1, +1]`, values outside this range are clamped by the consumer.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq)]
pub struct OperatorInput {
    /// Forward demand.
    ///
    /// Positive is "forwards" along the X+ axis of the active control frame.
    pub x: f64,

    /// Sideways demand.
    ///
    /// Positive is to the left, along the Y+ axis of the active control frame.
    pub y: f64,

    /// Rotation demand.
    ///
    /// Follows the right hand rule about the Z+ (upwards) axis, so that positive demands rotate
    /// the robot anticlockwise.
    pub rotate: f64,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl OperatorInput {
    /// Create a new input with the given axes.
    pub fn new(x: f64, y: f64, rotate: f64) -> Self {
        Self { x, y, rotate }
    }

    /// The magnitude of the translation demand, clamped to 1.
    pub fn move_request(&self) -> f64 {
        self.x.hypot(self.y).min(1.0)
    }

    /// The direction of the translation demand.
    ///
    /// Units: radians
    pub fn move_direction_rad(&self) -> f64 {
        self.y.atan2(self.x)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_move_request_clamped() {
        let input = OperatorInput::new(1.0, 1.0, 0.0);

        assert_eq!(input.move_request(), 1.0);
        assert!((input.move_direction_rad() - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
    }
}
