//! # Kinematics module
//!
//! Converts demanded chassis motion into per-module setpoints (inverse kinematics, with second
//! order corrections) and measured module data back into chassis motion (forward kinematics).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod forward;
mod geometry;
mod inverse;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
pub use forward::*;
pub use geometry::*;
pub use inverse::*;
pub use params::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Instantaneous linear and angular velocity of the chassis.
///
/// The frame the motion is expressed in is always given by the context it's used in, usually by
/// an accompanying [`ControlCentricity`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChassisMotion {
    /// Units: meters/second
    pub vx_ms: f64,

    /// Units: meters/second
    pub vy_ms: f64,

    /// Units: radians/second
    pub omega_rads: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The reference frame that chassis motion demands are expressed in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlCentricity {
    FieldCentric,
    RobotCentric,
}

/// Possible errors that can occur in the kinematics.
#[derive(Debug, thiserror::Error)]
pub enum KinematicsError {
    #[error("A swerve drive requires at least two modules, found {0}")]
    TooFewModules(usize),

    #[error("The position of module {0} is not finite")]
    NonFiniteModulePosition(usize),

    #[error("The loop period must be positive and finite, found {0} s")]
    InvalidLoopPeriod(f64),

    #[error("The module geometry is degenerate: {0}")]
    DegenerateGeometry(&'static str),

    #[error("Expected data for {expected} modules but found {found}")]
    ModuleCountMismatch { expected: usize, found: usize },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChassisMotion {
    pub fn new(vx_ms: f64, vy_ms: f64, omega_rads: f64) -> Self {
        Self {
            vx_ms,
            vy_ms,
            omega_rads,
        }
    }

    /// Linear speed of the chassis.
    ///
    /// Units: meters/second
    pub fn speed_ms(&self) -> f64 {
        self.vx_ms.hypot(self.vy_ms)
    }

    /// Rotate the linear part of the motion by the given angle.
    ///
    /// Rotating by `-heading` converts field-centric motion into robot-centric motion.
    pub fn rotated(&self, angle_rad: f64) -> Self {
        let (s, c) = angle_rad.sin_cos();
        Self {
            vx_ms: self.vx_ms * c - self.vy_ms * s,
            vy_ms: self.vx_ms * s + self.vy_ms * c,
            omega_rads: self.omega_rads,
        }
    }
}

impl ControlCentricity {
    /// Get the other centricity.
    pub fn toggled(&self) -> Self {
        match self {
            ControlCentricity::FieldCentric => ControlCentricity::RobotCentric,
            ControlCentricity::RobotCentric => ControlCentricity::FieldCentric,
        }
    }
}
