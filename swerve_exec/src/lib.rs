//! # Swerve library.
//!
//! This library allows other crates in the workspace to access items defined inside the swerve
//! crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Data store - everything shared between the stages of one cycle
pub mod data_store;

/// Drive control module - turns operator and autonomy intent into module demands
pub mod drive_ctrl;

/// Drivetrain - owns the module drivers and IMU and applies demands to them
pub mod drivetrain;

/// Planar geometry - poses, twists and the maps between them
pub mod geom;

/// Goals - alliance relative goal poses and their approach paths
pub mod goal;

/// Kinematics - second order inverse and least squares forward swerve kinematics
pub mod kinematics;

/// Localisation module - fuses odometry and vision into a pose estimate
pub mod loc;

/// Executable parameters
pub mod params;

/// Simulated equipment
pub mod sim;

/// Telecommand processor - maps telecommands onto the data store
pub mod tc_processor;

/// Telemetry recording
pub mod telemetry;
