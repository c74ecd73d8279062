//! # Goal and approach module
//!
//! Autonomous routines describe where they want the robot to end up with an `AllianceGoal`, a pair
//! of poses of which one is selected by the robot's alliance. Each goal derives a final approach
//! pose a short distance out from the goal and, once prepared with path constraints, a short
//! straight path from the approach pose into the goal which is handed to a path follower.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod alliance_goal;
mod path;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use alliance_goal::*;
pub use path::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised by goal accessors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GoalError {
    #[error("The goal's approach paths have not been prepared")]
    NotPrepared,

    #[error("The robot's alliance is not known")]
    AllianceIndeterminate,

    #[error("Path constraints must be positive and finite: {0:?}")]
    InvalidConstraints(PathConstraints),

    #[error("Goal poses must be finite and the approach distance non-negative")]
    InvalidGoal,
}
