//! # Localisation module
//!
//! Provides the robot's best estimate of its field pose, found by fusing wheel odometry with
//! asynchronous vision pose estimates.
//!
//! Odometry is applied every cycle and never jumps. Vision estimates arrive late and are blended
//! in at the time they were captured, weighted by the relative uncertainty of odometry and the
//! estimate itself. Only vision or an explicit reset may move the estimate discontinuously.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod estimator;
mod odometry;
mod params;
mod pose_buffer;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use estimator::*;
pub use odometry::*;
pub use params::*;
pub use pose_buffer::*;

use crate::kinematics::KinematicsError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during localisation.
#[derive(Debug, thiserror::Error)]
pub enum LocError {
    #[error("Odometry kinematics failed: {0}")]
    Kinematics(#[from] KinematicsError),

    #[error("Odometry standard deviations must be finite and non-negative, found {0:?}")]
    InvalidOdometryStdDev([f64; 3]),

    #[error("The history window must be positive and finite, found {0} s")]
    InvalidHistoryWindow(f64),

    #[error("Cannot reset to a non-finite pose")]
    NonFiniteResetPose,
}
