//! # Telecommand module
//!
//! Commands issued to the drive by an operator, a script or an autonomous routine. Telecommands
//! are exchanged as JSON objects of the form `{"type": "<TcType>", "payload": <payload>}`, where
//! commands without data omit the payload.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod drive;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Internal
use drive::OperatorInput;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An alliance relative goal for an autonomous approach.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GoalSpec {
    /// Goal pose if playing for the blue alliance, `[x, y, heading]`.
    ///
    /// Units: meters, meters, radians
    pub blue_pose: [f64; 3],

    /// Goal pose if playing for the red alliance, `[x, y, heading]`.
    ///
    /// Units: meters, meters, radians
    pub red_pose: [f64; 3],

    /// Length of the straight final approach into the goal.
    ///
    /// Units: meters
    pub approach_distance_m: f64,

    /// True if the robot's rear should face the goal.
    #[serde(default)]
    pub reversed: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand to the drive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum Tc {
    /// New operator stick demands, held until the next `Operator` command.
    Operator(OperatorInput),

    /// Drive with operator demands and closed loop heading hold.
    Teleop,

    /// Aim the robot at a point on the field while translating.
    AimAtPoint {
        /// The target point in the field frame, or `None` for plain teleop rotation.
        target_m: Option<[f64; 2]>,

        /// Point the robot's rear at the target.
        #[serde(default)]
        reversed: bool,

        /// Compensate the aim for the robot's own motion.
        #[serde(default)]
        velocity_correction: bool,
    },

    /// Rotate the robot in place by the given angle.
    TurnBy { angle_rad: f64 },

    /// Snap to the alliance's fixed heading while translating.
    Snap,

    /// Begin anti-tip recovery.
    AntiTip,

    /// Apply robot relative motion from an external autonomy source.
    Auto,

    /// New autonomy motion, `[vx, vy, omega]`, held until the next `AutoMotion` command.
    ///
    /// Units: meters/second, meters/second, radians/second
    AutoMotion([f64; 3]),

    /// Drive to a goal via its final approach.
    GoToGoal(GoalSpec),

    /// Stop the drive and leave the active mode.
    Stop,

    /// Lock the wheels.
    Lock,

    ToggleCentricity,
    EnableTractionControl,
    DisableTractionControl,
    ToggleTractionControl,

    /// Reset the pose estimate to the given pose, `[x, y, heading]`.
    ResetPose([f64; 3]),

    /// Reset the pose estimate to the latest vision estimate.
    ResetPoseToVision,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)
    }

    /// Serialise the TC into a JSON packet
    pub fn to_json(&self) -> Result<String, TcParseError> {
        serde_json::to_string(self).map_err(TcParseError::InvalidJson)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_unit_tc() {
        assert_eq!(Tc::from_json(r#"{"type": "Snap"}"#).unwrap(), Tc::Snap);
    }

    #[test]
    fn test_parse_payload_tc() {
        let tc = Tc::from_json(
            r#"{"type": "Operator", "payload": {"x": 0.5, "y": 0.0, "rotate": -0.2}}"#,
        )
        .unwrap();

        assert_eq!(tc, Tc::Operator(OperatorInput::new(0.5, 0.0, -0.2)));

        let tc = Tc::from_json(
            r#"{"type": "AimAtPoint", "payload": {"target_m": [0.2, 5.5], "reversed": true}}"#,
        )
        .unwrap();

        assert_eq!(
            tc,
            Tc::AimAtPoint {
                target_m: Some([0.2, 5.5]),
                reversed: true,
                velocity_correction: false
            }
        );
    }

    #[test]
    fn test_parse_goal() {
        let tc = Tc::from_json(
            r#"{"type": "GoToGoal", "payload": {
                "blue_pose": [3.0, 1.0, 0.5],
                "red_pose": [13.5, 1.0, 2.6],
                "approach_distance_m": 1.0
            }}"#,
        )
        .unwrap();

        match tc {
            Tc::GoToGoal(spec) => {
                assert_eq!(spec.blue_pose, [3.0, 1.0, 0.5]);
                assert!(!spec.reversed);
            }
            t => panic!("expected a goal, got {:?}", t),
        }
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Tc::from_json(r#"{"type": "Fly"}"#).is_err());
        assert!(Tc::from_json("not json").is_err());
    }
}
