//! Implementations for the DriveCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use nalgebra::Vector2;
use serde::Serialize;
use std::f64::consts::PI;

// Internal
use super::{
    DriveCtrlError, DriveDem, InputMap, Params, Pid, ProfileConstraints, ProfiledPid,
    RotateController,
};
use crate::{
    geom::Pose,
    goal::{AllianceGoal, PathFollower},
    kinematics::{ChassisMotion, ControlCentricity, SwerveKinematics},
};
use comms_if::{
    alliance::Alliance,
    eqpt::{imu::ImuData, module::TractionInput},
    tc::drive::OperatorInput,
};
use util::{maths::wrap_angle, module::State};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive control module state
pub struct DriveCtrl {
    pub(crate) params: Params,

    pub(crate) kinematics: SwerveKinematics,

    pub(crate) throttle_map: InputMap,
    pub(crate) rotate: RotateController,
    pub(crate) aim_front: ProfiledPid,
    pub(crate) aim_back: ProfiledPid,

    pub(crate) follower: Box<dyn PathFollower>,

    pub(crate) centricity: ControlCentricity,
    pub(crate) traction_enabled: bool,

    pub(crate) mode: DriveMode,

    /// Yaw being turned to in `TurnBy`.
    ///
    /// Units: radians
    pub(crate) turn_target_rad: f64,

    pub(crate) report: StatusReport,
}

/// Input data to drive control.
#[derive(Debug, Clone, Default)]
pub struct InputData {
    /// Current pose estimate.
    pub pose: Pose,

    /// Direction of travel over the field.
    ///
    /// Units: radians
    pub travel_direction_rad: f64,

    /// IMU data, with the velocity filtered.
    pub imu: ImuData,

    /// Latest operator demand.
    pub operator: OperatorInput,

    pub alliance: Option<Alliance>,

    /// Robot relative motion from an external autonomy source, used in `Auto`.
    pub auto_motion: Option<ChassisMotion>,

    /// Robot relative motion measured by the modules.
    pub measured_motion: ChassisMotion,
}

/// Status report for DriveCtrl processing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusReport {
    pub mode: ModeKind,

    /// Mode changes since the last report.
    pub transitions: Vec<ModeTransition>,

    /// Heading error to the aim point.
    ///
    /// Units: radians
    pub aim_error_rad: Option<f64>,

    pub is_aimed: bool,

    /// Second order turn rate of each module.
    ///
    /// Units: radians/second
    pub module_turn_rates_rads: Vec<f64>,

    /// True if the module speeds were scaled down this cycle.
    pub desaturated: bool,

    /// True if the goal was reached this cycle.
    pub goal_reached: bool,
}

/// A change of mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct ModeTransition {
    pub from: ModeKind,
    pub to: ModeKind,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Drive modes and their arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum DriveMode {
    /// No demands are produced.
    Idle,

    Teleop,

    AimAtPoint {
        /// Field point to aim at, or `None` to rotate as in teleop.
        ///
        /// Units: meters
        target_m: Option<Vector2<f64>>,

        /// Point the rear of the robot at the target.
        reversed: bool,

        /// Lead the target to account for the robot's motion across the line of sight.
        velocity_correction: bool,

        /// Use this centricity rather than the controller's current one.
        centricity: Option<ControlCentricity>,
    },

    TurnBy {
        /// Units: radians
        angle_rad: f64,
    },

    Snap,

    AntiTip,

    Auto,

    GoToGoal(AllianceGoal),
}

/// The kind of a mode, without its arguments.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub enum ModeKind {
    #[default]
    Idle,
    Teleop,
    AimAtPoint,
    TurnBy,
    Snap,
    AntiTip,
    Auto,
    GoToGoal,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            DriveMode::Idle => ModeKind::Idle,
            DriveMode::Teleop => ModeKind::Teleop,
            DriveMode::AimAtPoint { .. } => ModeKind::AimAtPoint,
            DriveMode::TurnBy { .. } => ModeKind::TurnBy,
            DriveMode::Snap => ModeKind::Snap,
            DriveMode::AntiTip => ModeKind::AntiTip,
            DriveMode::Auto => ModeKind::Auto,
            DriveMode::GoToGoal(_) => ModeKind::GoToGoal,
        }
    }
}

impl State for DriveCtrl {
    type InputData = InputData;
    type OutputData = Vec<DriveDem>;
    type StatusReport = StatusReport;
    type ProcError = DriveCtrlError;

    /// Perform cyclic processing of drive control.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let mut dems = Vec::new();

        if self.params.auto_anti_tip
            && self.mode != DriveMode::AntiTip
            && self.is_tipping(&input_data.imu)
        {
            warn!("Tip detected, entering anti-tip");
            dems.extend(self.enter(DriveMode::AntiTip, input_data)?);
        }

        match self.mode.clone() {
            DriveMode::Idle => (),
            DriveMode::Teleop => dems.push(self.teleop(input_data)),
            DriveMode::AimAtPoint {
                target_m,
                reversed,
                velocity_correction,
                centricity,
            } => dems.push(self.aim_at_point(
                input_data,
                target_m,
                reversed,
                velocity_correction,
                centricity.unwrap_or(self.centricity),
            )),
            DriveMode::TurnBy { .. } => dems.push(self.turn_by(input_data)),
            DriveMode::Snap => dems.push(self.snap(input_data)),
            DriveMode::AntiTip => dems.extend(self.anti_tip(input_data)),
            DriveMode::Auto => {
                let motion = input_data.auto_motion.unwrap_or_default();
                dems.push(self.auto_drive(input_data, &motion));
            }
            DriveMode::GoToGoal(_) => dems.extend(self.go_to_goal(input_data)),
        }

        self.report.mode = self.mode.kind();
        self.report.is_aimed = self.is_aimed(input_data.imu.yaw_rate_rads);

        Ok((dems, std::mem::take(&mut self.report)))
    }
}

impl DriveCtrl {
    /// Create a new drive controller.
    pub fn new(
        params: Params,
        kinematics: SwerveKinematics,
        follower: Box<dyn PathFollower>,
    ) -> Result<Self, DriveCtrlError> {
        if !(params.max_linear_speed_ms.is_finite() && params.max_linear_speed_ms > 0.0) {
            return Err(DriveCtrlError::InvalidParam("max_linear_speed_ms"));
        }
        if !(params.anti_tip_speed_fraction > 0.0 && params.anti_tip_speed_fraction <= 1.0) {
            return Err(DriveCtrlError::InvalidParam("anti_tip_speed_fraction"));
        }
        if params.balanced_threshold_rad >= params.tip_threshold_rad {
            return Err(DriveCtrlError::InvalidParam("balanced_threshold_rad"));
        }
        if !(params.aim_max_velocity_rads > 0.0 && params.aim_max_acceleration_radss > 0.0) {
            return Err(DriveCtrlError::InvalidParam("aim constraints"));
        }
        params.path_constraints.validate()?;

        let period_s = kinematics.loop_period_s();

        let throttle_map = InputMap::new(
            &params.throttle_curve_x,
            &params.throttle_curve_y,
            params.deadband,
            params.max_linear_speed_ms,
        )?;

        let mut rotate_pid = Pid::new(
            params.rotate_kp,
            params.rotate_ki,
            params.rotate_kd,
            period_s,
        );
        rotate_pid.set_tolerance(params.rotate_tolerance_rad);

        let rotate = RotateController::new(
            InputMap::new(&params.turn_curve_x, &params.turn_curve_y, params.deadband, 1.0)?,
            rotate_pid,
            params.turn_scalar_rads,
            params.lookahead_cycles,
        );

        let aim_constraints = ProfileConstraints {
            max_velocity: params.aim_max_velocity_rads,
            max_acceleration: params.aim_max_acceleration_radss,
        };
        let mut aim_front =
            ProfiledPid::new(params.aim_kp, 0.0, params.aim_kd, aim_constraints, period_s);
        aim_front.enable_continuous_input(-PI, PI);
        aim_front.set_tolerance(params.aim_tolerance_rad);
        let aim_back = aim_front.clone();

        let centricity = if params.field_centric {
            ControlCentricity::FieldCentric
        }
        else {
            ControlCentricity::RobotCentric
        };

        Ok(Self {
            params,
            kinematics,
            throttle_map,
            rotate,
            aim_front,
            aim_back,
            follower,
            centricity,
            traction_enabled: true,
            mode: DriveMode::Idle,
            turn_target_rad: 0.0,
            report: StatusReport::default(),
        })
    }

    /// Leave the current mode and enter a new one, returning the demands from leaving.
    ///
    /// If the new mode cannot be entered the current mode is left running.
    pub fn enter(
        &mut self,
        mode: DriveMode,
        input: &InputData,
    ) -> Result<Vec<DriveDem>, DriveCtrlError> {
        // Prepare anything which can fail before touching the current mode
        let mode = match mode {
            DriveMode::AntiTip if !self.is_tipping(&input.imu) => {
                return Err(DriveCtrlError::NotTipping)
            }
            DriveMode::GoToGoal(mut goal) => {
                goal.prepare(&self.params.path_constraints)?;
                let path = goal.final_approach_path(&input.alliance)?.clone();

                let dems = self.exit(input);
                self.follower.start(&path, &input.pose);
                info!(
                    "Following final approach from {:?} to {:?}",
                    path.start().map(|p| p.to_array()),
                    path.end().map(|p| p.to_array())
                );
                self.set_mode(DriveMode::GoToGoal(goal));
                return Ok(dems);
            }
            m => m,
        };

        let dems = self.exit(input);

        match mode {
            DriveMode::Teleop | DriveMode::AimAtPoint { .. } | DriveMode::Snap => {
                self.reset_controllers(input)
            }
            DriveMode::TurnBy { angle_rad } => {
                self.reset_controllers(input);
                self.turn_target_rad = input.imu.yaw_rad + angle_rad;
            }
            _ => (),
        }

        self.set_mode(mode);

        Ok(dems)
    }

    /// Leave the current mode, returning to `Idle`.
    ///
    /// Leaving `Idle` does nothing, so this may be called any number of times.
    pub fn exit(&mut self, input: &InputData) -> Vec<DriveDem> {
        let dems = match self.mode {
            DriveMode::Idle => return Vec::new(),
            DriveMode::AntiTip => vec![DriveDem::Stop, DriveDem::Lock],
            DriveMode::GoToGoal(_) => {
                self.follower.cancel();
                vec![DriveDem::Stop]
            }
            _ => vec![DriveDem::Stop],
        };

        self.rotate.reset(input.imu.yaw_rad);
        self.set_mode(DriveMode::Idle);

        dems
    }

    /// Leave the current mode and stop the modules.
    pub fn stop(&mut self, input: &InputData) -> Vec<DriveDem> {
        let mut dems = self.exit(input);
        if !dems.contains(&DriveDem::Stop) {
            dems.push(DriveDem::Stop);
        }
        self.rotate.reset(input.imu.yaw_rad);
        dems
    }

    /// Leave the current mode and lock the modules.
    pub fn lock(&mut self, input: &InputData) -> Vec<DriveDem> {
        let mut dems = self.exit(input);
        if !dems.contains(&DriveDem::Lock) {
            dems.push(DriveDem::Lock);
        }
        dems
    }

    pub fn toggle_centricity(&mut self) {
        self.centricity = self.centricity.toggled();
        info!("Control centricity now {:?}", self.centricity);
    }

    pub fn set_traction_control(&mut self, enabled: bool) -> DriveDem {
        self.traction_enabled = enabled;
        if enabled {
            DriveDem::EnableTractionControl
        }
        else {
            DriveDem::DisableTractionControl
        }
    }

    pub fn toggle_traction_control(&mut self) -> DriveDem {
        self.set_traction_control(!self.traction_enabled)
    }

    pub fn mode(&self) -> &DriveMode {
        &self.mode
    }

    pub fn centricity(&self) -> ControlCentricity {
        self.centricity
    }

    pub fn traction_enabled(&self) -> bool {
        self.traction_enabled
    }

    pub fn kinematics(&self) -> &SwerveKinematics {
        &self.kinematics
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// True if either aim controller has reached its goal and the robot has stopped turning.
    pub fn is_aimed(&self, yaw_rate_rads: f64) -> bool {
        (self.aim_front.at_goal() || self.aim_back.at_goal())
            && yaw_rate_rads.abs() < self.params.aim_velocity_threshold_rads
    }

    /// Drive with traction control inputs in the given frame.
    pub(crate) fn drive(
        &mut self,
        input: &InputData,
        centricity: ControlCentricity,
        motion: &ChassisMotion,
    ) -> DriveDem {
        let heading_rad = input.pose.heading_rad + alliance_correction_rad(input.alliance);
        let output = self.kinematics.calc_setpoints(motion, heading_rad, centricity);

        let inertial_velocity_ms = input.imu.velocity_ms[0].hypot(input.imu.velocity_ms[1]);
        let traction = output
            .module_turn_rates_rads
            .iter()
            .map(|rate| TractionInput {
                inertial_velocity_ms,
                rotate_rate_rads: output.corrected.omega_rads,
                module_turn_rate_rads: *rate,
            })
            .collect();

        self.report.desaturated = output.desaturated;
        self.report.module_turn_rates_rads = output.module_turn_rates_rads;

        DriveDem::Set {
            setpoints: output.setpoints,
            traction: Some(traction),
        }
    }

    /// Drive robot relative without traction control.
    pub(crate) fn drive_robot_centric(&mut self, input: &InputData, motion: &ChassisMotion) -> DriveDem {
        let output = self.kinematics.calc_setpoints(
            motion,
            input.pose.heading_rad,
            ControlCentricity::RobotCentric,
        );

        self.report.desaturated = output.desaturated;
        self.report.module_turn_rates_rads = output.module_turn_rates_rads;

        DriveDem::Set {
            setpoints: output.setpoints,
            traction: None,
        }
    }

    /// Keep both aim controllers on the current heading so a later aim starts smoothly.
    pub(crate) fn track_aim_controllers(&mut self, heading_rad: f64) {
        let back_rad = wrap_angle(heading_rad + PI);
        self.aim_front.calculate(heading_rad, heading_rad);
        self.aim_back.calculate(back_rad, back_rad);
    }

    pub(super) fn reset_controllers(&mut self, input: &InputData) {
        let heading_rad = input.pose.heading_rad;
        self.rotate.reset(input.imu.yaw_rad);
        self.aim_front.reset(heading_rad);
        self.aim_back.reset(wrap_angle(heading_rad + PI));
    }

    pub(super) fn set_mode(&mut self, mode: DriveMode) {
        let transition = ModeTransition {
            from: self.mode.kind(),
            to: mode.kind(),
        };

        if transition.from != transition.to {
            debug!("DriveCtrl mode {:?} -> {:?}", transition.from, transition.to);
            self.report.transitions.push(transition);
        }

        self.mode = mode;
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Heading offset applied to field centric control, so that forwards is always away from the
/// alliance's own end of the field.
pub(crate) fn alliance_correction_rad(alliance: Option<Alliance>) -> f64 {
    match alliance {
        Some(Alliance::Red) => PI,
        _ => 0.0,
    }
}
