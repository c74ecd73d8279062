//! # Drive control module
//!
//! Drive control turns operator and autonomy intent into drivetrain demands. It runs one mode at
//! a time, selected from outside:
//!
//! - `Teleop`: throttle curve translation with closed loop heading hold.
//! - `AimAtPoint`: translation as teleop while a profiled controller points the front (or rear) of
//!   the robot at a field point, optionally leading the point to account for the robot's motion.
//! - `TurnBy`: turn on the spot by a relative angle.
//! - `Snap`: translation as teleop while holding one of the alliance's field directions.
//! - `AntiTip`: drive downhill at reduced speed until level, then stop and lock.
//! - `Auto`: apply externally computed robot relative motion.
//! - `GoToGoal`: follow the final approach path of an alliance goal, then hold.
//!
//! Every mode ends in the same place, the kinematics, and produces at most one set of module
//! setpoints per cycle.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod aim;
mod anti_tip;
mod controllers;
mod curve;
mod params;
mod rotate;
mod state;
mod teleop;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
pub use controllers::*;
pub use curve::*;
pub use params::*;
pub use rotate::*;
pub use state::*;

use crate::{goal::GoalError, kinematics::KinematicsError};
use comms_if::eqpt::module::{ModuleSetpoint, TractionInput};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A demand on the drivetrain.
///
/// Demands produced in one cycle are applied in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DriveDem {
    /// Drive every module to its setpoint, with traction control inputs if given.
    Set {
        setpoints: Vec<ModuleSetpoint>,
        traction: Option<Vec<TractionInput>>,
    },

    /// Stop all modules.
    Stop,

    /// Lock all modules in an X so the robot resists being pushed.
    Lock,

    EnableTractionControl,

    DisableTractionControl,
}

/// Possible errors that can occur in drive control.
#[derive(Debug, thiserror::Error)]
pub enum DriveCtrlError {
    #[error("Kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),

    #[error("Goal error: {0}")]
    Goal(#[from] GoalError),

    #[error("Invalid input curve: {0}")]
    Curve(#[from] CurveError),

    #[error("Cannot enter anti-tip, the robot is not tipping")]
    NotTipping,

    #[error("Invalid drive control parameter: {0}")]
    InvalidParam(&'static str),
}
