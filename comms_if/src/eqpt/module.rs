//! # Swerve Module Equipment Interface
//!
//! A swerve module is one independently driven and steered wheel assembly. Module data is always
//! exchanged in the fixed order given by [`ModuleId`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The number of swerve modules on the robot.
pub const NUM_MODULES: usize = 4;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A demand for a single module.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq)]
pub struct ModuleSetpoint {
    /// Wheel ground speed.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Steer angle relative to the robot's forward (+X) axis, positive anticlockwise.
    ///
    /// Units: radians
    pub angle_rad: f64,
}

/// The measured state of a single module.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq)]
pub struct ModuleState {
    /// Wheel ground speed.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Steer angle relative to the robot's forward (+X) axis.
    ///
    /// Units: radians
    pub angle_rad: f64,
}

/// The measured cumulative position of a single module.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq)]
pub struct ModulePosition {
    /// Cumulative distance travelled by the wheel since the driver was initialised.
    ///
    /// Units: meters
    pub distance_m: f64,

    /// Current steer angle relative to the robot's forward (+X) axis.
    ///
    /// Units: radians
    pub angle_rad: f64,
}

/// Additional data passed with a setpoint so that a module can apply traction control.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq)]
pub struct TractionInput {
    /// The robot's inertial (IMU measured) speed.
    ///
    /// Units: meters/second
    pub inertial_velocity_ms: f64,

    /// The robot's demanded rotation rate.
    ///
    /// Units: radians/second
    pub rotate_rate_rads: f64,

    /// The module's second order turn rate correction.
    ///
    /// Units: radians/second
    pub module_turn_rate_rads: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of all modules on the robot, in their canonical order.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum ModuleId {
    LeftFront,
    RightFront,
    LeftRear,
    RightRear,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Driver for a single swerve module.
///
/// Implementations report their own hardware faults, none of these calls can fail from the point
/// of view of the control core.
pub trait SwerveModule {
    /// Get the current measured state (speed and angle) of the module.
    fn state(&self) -> ModuleState;

    /// Get the current cumulative position of the module.
    fn position(&self) -> ModulePosition;

    /// Command the module to the given setpoint, optionally with traction control data.
    fn set(&mut self, setpoint: ModuleSetpoint, traction: Option<TractionInput>);

    /// Point the wheel at 45 degrees to the robot's axes so that the robot resists being pushed.
    fn lock(&mut self);

    /// Stop the drive motor, holding the current steer angle.
    fn stop(&mut self);

    /// Enable the module's traction control.
    fn enable_traction_control(&mut self);

    /// Disable the module's traction control.
    fn disable_traction_control(&mut self);
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ModuleId {
    /// All module IDs in canonical order.
    pub const ALL: [ModuleId; NUM_MODULES] = [
        ModuleId::LeftFront,
        ModuleId::RightFront,
        ModuleId::LeftRear,
        ModuleId::RightRear,
    ];

    /// The index of this module in any module-ordered array.
    pub fn index(&self) -> usize {
        match self {
            ModuleId::LeftFront => 0,
            ModuleId::RightFront => 1,
            ModuleId::LeftRear => 2,
            ModuleId::RightRear => 3,
        }
    }
}
