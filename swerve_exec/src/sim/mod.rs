//! # Simulated equipment
//!
//! A minimal stand-in for the robot's hardware, used by the executable and by closed loop tests.
//! All equipment shares one [`SimWorld`], which is stepped once per cycle after the demands have
//! been applied.
//!
//! Modules are ideal: they reach their setpoint instantly and never slip. The IMU reads the
//! world's true yaw and velocity, and the vision source reports the true pose with a small
//! deterministic error.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod equipment;
mod follower;
mod world;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use equipment::*;
pub use follower::*;
pub use world::*;

#[cfg(test)]
pub(crate) fn test_geometry() -> crate::kinematics::ModuleGeometry {
    let half = 0.2794;
    crate::kinematics::ModuleGeometry::from_arrays(&[
        [half, half],
        [half, -half],
        [-half, half],
        [-half, -half],
    ])
    .unwrap()
}
