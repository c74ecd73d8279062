//! Simulated world state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use std::{cell::RefCell, rc::Rc};

// Internal
use crate::{
    geom::{Pose, Twist},
    kinematics::{ForwardKinematics, KinematicsError, ModuleGeometry},
};
use comms_if::eqpt::{
    imu::ImuData,
    module::{ModulePosition, ModuleSetpoint, ModuleState},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// World shared between all simulated equipment.
pub type SharedWorld = Rc<RefCell<SimWorld>>;

/// The true state of the simulated robot.
#[derive(Debug, Clone)]
pub struct SimWorld {
    /// Units: seconds
    time_s: f64,

    pose: Pose,

    /// Continuous yaw, as a gyro would report it.
    ///
    /// Units: radians
    yaw_rad: f64,

    /// Units: radians/second
    yaw_rate_rads: f64,

    /// Robot relative velocity.
    ///
    /// Units: meters/second
    velocity_ms: [f64; 2],

    /// Units: radians
    pub pitch_rad: f64,

    /// Units: radians
    pub roll_rad: f64,

    kinematics: ForwardKinematics,

    module_positions_m: Vec<Vector2<f64>>,

    modules: Vec<SimModuleState>,
}

/// True state of one simulated module.
#[derive(Debug, Copy, Clone, Default)]
pub struct SimModuleState {
    pub state: ModuleState,

    /// Units: meters
    pub distance_m: f64,

    pub traction_enabled: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimWorld {
    pub fn new(geometry: ModuleGeometry, initial_pose: Pose) -> Result<Self, KinematicsError> {
        let module_positions_m = geometry.positions_m().to_vec();
        let modules = vec![
            SimModuleState {
                traction_enabled: true,
                ..Default::default()
            };
            module_positions_m.len()
        ];

        Ok(Self {
            time_s: 0.0,
            pose: initial_pose,
            yaw_rad: initial_pose.heading_rad,
            yaw_rate_rads: 0.0,
            velocity_ms: [0.0; 2],
            pitch_rad: 0.0,
            roll_rad: 0.0,
            kinematics: ForwardKinematics::new(geometry)?,
            module_positions_m,
            modules,
        })
    }

    pub fn into_shared(self) -> SharedWorld {
        Rc::new(RefCell::new(self))
    }

    /// Move the robot according to its module states for `dt_s` seconds.
    pub fn step(&mut self, dt_s: f64) -> Result<(), KinematicsError> {
        let states: Vec<ModuleState> = self.modules.iter().map(|m| m.state).collect();
        let motion = self.kinematics.to_chassis_motion(&states)?;

        self.pose = self.pose.exp(&Twist::new(
            motion.vx_ms * dt_s,
            motion.vy_ms * dt_s,
            motion.omega_rads * dt_s,
        ));
        self.yaw_rad += motion.omega_rads * dt_s;
        self.yaw_rate_rads = motion.omega_rads;
        self.velocity_ms = [motion.vx_ms, motion.vy_ms];

        for m in self.modules.iter_mut() {
            m.distance_m += m.state.speed_ms * dt_s;
        }

        self.time_s += dt_s;

        Ok(())
    }

    /// Units: seconds
    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn num_modules(&self) -> usize {
        self.modules.len()
    }

    pub fn imu(&self) -> ImuData {
        ImuData {
            yaw_rad: self.yaw_rad,
            pitch_rad: self.pitch_rad,
            roll_rad: self.roll_rad,
            yaw_rate_rads: self.yaw_rate_rads,
            velocity_ms: self.velocity_ms,
        }
    }

    /// # Panics
    /// - If `index` is not a module in this world.
    pub fn module(&self, index: usize) -> &SimModuleState {
        &self.modules[index]
    }

    pub fn module_position(&self, index: usize) -> ModulePosition {
        let m = &self.modules[index];
        ModulePosition {
            distance_m: m.distance_m,
            angle_rad: m.state.angle_rad,
        }
    }

    pub(crate) fn set_module(&mut self, index: usize, setpoint: ModuleSetpoint) {
        self.modules[index].state = ModuleState {
            speed_ms: setpoint.speed_ms,
            angle_rad: setpoint.angle_rad,
        };
    }

    pub(crate) fn stop_module(&mut self, index: usize) {
        self.modules[index].state.speed_ms = 0.0;
    }

    /// Point the module along the diagonal through the robot's centre.
    pub(crate) fn lock_module(&mut self, index: usize) {
        let p = self.module_positions_m[index];
        self.modules[index].state = ModuleState {
            speed_ms: 0.0,
            angle_rad: p[1].atan2(p[0]),
        };
    }

    pub(crate) fn set_module_traction(&mut self, index: usize, enabled: bool) {
        self.modules[index].traction_enabled = enabled;
    }
}
