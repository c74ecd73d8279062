//! # Communications interface crate.
//!
//! Provides all common interfaces between the swerve control core and the
//! external collaborators it is wired to: the wheel module drivers, the
//! inertial sensor, the vision pipeline, the alliance source, telemetry and
//! operator commands.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Alliance declaration and its source
pub mod alliance;

/// Command, sensing and estimate definitions for equipment (modules, IMU, vision)
pub mod eqpt;

/// Operator commands
pub mod tc;

/// Telemetry sink interface
pub mod tm;
