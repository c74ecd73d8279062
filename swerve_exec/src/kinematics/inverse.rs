//! # Second order inverse kinematics
//!
//! Demands are held constant for one control period. Integrating translation and rotation
//! independently over that period bends the robot's path, so the demanded motion is first
//! corrected with the exact arc logarithm before being split into module setpoints.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::{Rotation2, Vector2};
use serde::Serialize;

// Internal
use super::{ChassisMotion, ControlCentricity, KinematicsError, ModuleGeometry, Params};
use crate::geom::{Pose, Twist};
use comms_if::eqpt::module::ModuleSetpoint;
use util::maths::wrap_angle;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Second order swerve inverse kinematics.
#[derive(Debug, Clone)]
pub struct SwerveKinematics {
    geometry: ModuleGeometry,

    /// Units: seconds
    loop_period_s: f64,

    /// Units: meters/second
    max_module_speed_ms: f64,

    /// Last commanded robot relative angle of each module, held when a module's speed is zero.
    prev_angles_rad: Vec<f64>,

    /// Second order turn rate of each module from the last calculation.
    module_turn_rates_rads: Vec<f64>,
}

/// Result of one full inverse kinematics calculation.
#[derive(Debug, Clone, Serialize)]
pub struct KinematicsOutput {
    /// The corrected chassis motion the setpoints were derived from.
    pub corrected: ChassisMotion,

    /// Setpoints for each module in module order.
    pub setpoints: Vec<ModuleSetpoint>,

    /// Second order turn rate of each module.
    ///
    /// Units: radians/second
    pub module_turn_rates_rads: Vec<f64>,

    /// True if the setpoints were scaled down to respect the module speed limit.
    pub desaturated: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SwerveKinematics {
    /// Create new kinematics for the given geometry.
    pub fn new(
        geometry: ModuleGeometry,
        loop_period_s: f64,
        max_module_speed_ms: f64,
    ) -> Result<Self, KinematicsError> {
        if !(loop_period_s.is_finite() && loop_period_s > 0.0) {
            return Err(KinematicsError::InvalidLoopPeriod(loop_period_s));
        }

        let num_modules = geometry.num_modules();

        Ok(Self {
            geometry,
            loop_period_s,
            max_module_speed_ms,
            prev_angles_rad: vec![0.0; num_modules],
            module_turn_rates_rads: vec![0.0; num_modules],
        })
    }

    /// Create new kinematics from the parameters.
    pub fn from_params(params: &Params) -> Result<Self, KinematicsError> {
        Self::new(
            ModuleGeometry::from_arrays(&params.module_positions_m_rb)?,
            params.loop_period_s,
            params.max_module_speed_ms,
        )
    }

    pub fn geometry(&self) -> &ModuleGeometry {
        &self.geometry
    }

    pub fn loop_period_s(&self) -> f64 {
        self.loop_period_s
    }

    pub fn max_module_speed_ms(&self) -> f64 {
        self.max_module_speed_ms
    }

    /// Second order turn rate of each module from the last call to `to_module_setpoints`.
    ///
    /// These are consumed by module traction control and are not part of the setpoints.
    pub fn module_turn_rates(&self) -> &[f64] {
        &self.module_turn_rates_rads
    }

    /// Correct the desired motion for the curvature introduced by rotating while translating.
    ///
    /// The pose reached by holding the motion for one period is found, then the exact arc which
    /// reaches that pose is taken as the corrected motion. With no rotation this is the identity.
    pub fn correct_for_dynamics(&self, desired: &ChassisMotion) -> ChassisMotion {
        let dt = self.loop_period_s;

        let future_pose = Pose::new(
            desired.vx_ms * dt,
            desired.vy_ms * dt,
            desired.omega_rads * dt,
        );

        let twist: Twist = Pose::default().log(&future_pose);

        ChassisMotion {
            vx_ms: twist.dx_m / dt,
            vy_ms: twist.dy_m / dt,
            omega_rads: twist.dtheta_rad / dt,
        }
    }

    /// Convert chassis motion into per-module setpoints.
    ///
    /// For `FieldCentric` control the motion is in the field frame and `robot_heading_rad` is
    /// used to find each module's field position; for `RobotCentric` control the heading is
    /// ignored. The returned angles are always relative to the robot.
    ///
    /// A module with exactly zero speed keeps its previous angle. The setpoints are not
    /// desaturated, see [`desaturate`].
    pub fn to_module_setpoints(
        &mut self,
        motion: &ChassisMotion,
        robot_heading_rad: f64,
        centricity: ControlCentricity,
    ) -> Vec<ModuleSetpoint> {
        let heading_rad = match centricity {
            ControlCentricity::FieldCentric => robot_heading_rad,
            ControlCentricity::RobotCentric => 0.0,
        };
        let rotation = Rotation2::new(heading_rad);
        let omega = motion.omega_rads;

        let mut setpoints = Vec::with_capacity(self.geometry.num_modules());

        for (i, pos_m_rb) in self.geometry.positions_m().iter().enumerate() {
            let r: Vector2<f64> = rotation * pos_m_rb;

            // First order: translation plus omega cross r
            let v = Vector2::new(motion.vx_ms - omega * r[1], motion.vy_ms + omega * r[0]);
            let speed_ms = v.norm();

            if speed_ms == 0.0 {
                self.module_turn_rates_rads[i] = 0.0;
                setpoints.push(ModuleSetpoint {
                    speed_ms: 0.0,
                    angle_rad: self.prev_angles_rad[i],
                });
                continue;
            }

            let module_heading_rad = v[1].atan2(v[0]);

            // Second order: centripetal term rotated into the module's frame
            let (sin_h, cos_h) = module_heading_rad.sin_cos();
            let normal_accel = omega * omega * (r[0] * sin_h - r[1] * cos_h);
            self.module_turn_rates_rads[i] = normal_accel / speed_ms - omega;

            let angle_rad = wrap_angle(module_heading_rad - heading_rad);
            self.prev_angles_rad[i] = angle_rad;

            setpoints.push(ModuleSetpoint {
                speed_ms,
                angle_rad,
            });
        }

        setpoints
    }

    /// Correct, convert and desaturate the desired motion in one step.
    pub fn calc_setpoints(
        &mut self,
        desired: &ChassisMotion,
        robot_heading_rad: f64,
        centricity: ControlCentricity,
    ) -> KinematicsOutput {
        let corrected = self.correct_for_dynamics(desired);
        let mut setpoints = self.to_module_setpoints(&corrected, robot_heading_rad, centricity);
        let desaturated = desaturate(&mut setpoints, self.max_module_speed_ms);

        trace!(
            "Kinematics: desired {:?}, corrected {:?}, setpoints {:?}",
            desired,
            corrected,
            setpoints
        );

        KinematicsOutput {
            corrected,
            setpoints,
            module_turn_rates_rads: self.module_turn_rates_rads.clone(),
            desaturated,
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Scale all module speeds by the same factor so that none exceed `max_speed_ms`.
///
/// Returns true if any scaling took place.
pub fn desaturate(setpoints: &mut [ModuleSetpoint], max_speed_ms: f64) -> bool {
    let real_max_ms = setpoints
        .iter()
        .map(|s| s.speed_ms.abs())
        .fold(0.0, f64::max);

    if real_max_ms > max_speed_ms {
        let scale = max_speed_ms / real_max_ms;
        for s in setpoints.iter_mut() {
            s.speed_ms *= scale;
        }
        true
    }
    else {
        false
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    const HALF_SIDE_M: f64 = 0.5588 / 2.0;

    fn square_kinematics() -> SwerveKinematics {
        let geometry = ModuleGeometry::from_arrays(&[
            [HALF_SIDE_M, HALF_SIDE_M],
            [HALF_SIDE_M, -HALF_SIDE_M],
            [-HALF_SIDE_M, HALF_SIDE_M],
            [-HALF_SIDE_M, -HALF_SIDE_M],
        ])
        .unwrap();

        SwerveKinematics::new(geometry, 0.02, 4.3).unwrap()
    }

    #[test]
    fn test_correction_identity_without_rotation() {
        let kin = square_kinematics();

        for m in [
            ChassisMotion::new(1.0, 0.0, 0.0),
            ChassisMotion::new(-2.5, 3.1, 0.0),
            ChassisMotion::new(0.0, 0.0, 0.0),
        ]
        .iter()
        {
            let c = kin.correct_for_dynamics(m);
            assert_abs_diff_eq!(c.vx_ms, m.vx_ms, epsilon = 1e-12);
            assert_abs_diff_eq!(c.vy_ms, m.vy_ms, epsilon = 1e-12);
            assert_abs_diff_eq!(c.omega_rads, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_correction_reaches_future_pose() {
        let kin = square_kinematics();
        let desired = ChassisMotion::new(3.0, 1.0, 10.0);
        let dt = kin.loop_period_s();

        let c = kin.correct_for_dynamics(&desired);
        let end = Pose::default().exp(&Twist::new(
            c.vx_ms * dt,
            c.vy_ms * dt,
            c.omega_rads * dt,
        ));

        assert_abs_diff_eq!(end.x_m(), desired.vx_ms * dt, epsilon = 1e-12);
        assert_abs_diff_eq!(end.y_m(), desired.vy_ms * dt, epsilon = 1e-12);
        assert_abs_diff_eq!(end.heading_rad, desired.omega_rads * dt, epsilon = 1e-12);

        // The correction leans the translation into the direction of rotation
        assert!(c.vy_ms < desired.vy_ms);
    }

    #[test]
    fn test_pure_rotation_is_tangential() {
        let mut kin = square_kinematics();
        let motion = ChassisMotion::new(0.0, 0.0, PI);

        let setpoints =
            kin.to_module_setpoints(&motion, 0.0, ControlCentricity::RobotCentric);

        let positions = kin.geometry().positions_m().to_vec();
        for (sp, pos) in setpoints.iter().zip(positions.iter()) {
            let tangent = wrap_angle(pos[1].atan2(pos[0]) + FRAC_PI_2);
            assert_abs_diff_eq!(wrap_angle(sp.angle_rad - tangent), 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(sp.speed_ms, PI * pos.norm(), epsilon = 1e-12);
        }

        // LF/RF and LR/RR neighbours are a quarter turn apart
        assert_abs_diff_eq!(
            wrap_angle(setpoints[0].angle_rad - setpoints[1].angle_rad).abs(),
            FRAC_PI_2,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            wrap_angle(setpoints[2].angle_rad - setpoints[3].angle_rad).abs(),
            FRAC_PI_2,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_field_centric_heading() {
        let mut kin = square_kinematics();

        // Driving along field +X while facing field +Y means driving to the robot's right
        let setpoints = kin.to_module_setpoints(
            &ChassisMotion::new(1.0, 0.0, 0.0),
            FRAC_PI_2,
            ControlCentricity::FieldCentric,
        );

        for sp in setpoints.iter() {
            assert_abs_diff_eq!(sp.angle_rad, -FRAC_PI_2, epsilon = 1e-12);
            assert_abs_diff_eq!(sp.speed_ms, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zero_speed_holds_angle() {
        let mut kin = square_kinematics();

        let first = kin.to_module_setpoints(
            &ChassisMotion::new(0.0, 1.0, 0.0),
            0.0,
            ControlCentricity::RobotCentric,
        );
        let stopped = kin.to_module_setpoints(
            &ChassisMotion::default(),
            0.0,
            ControlCentricity::RobotCentric,
        );

        for (a, b) in first.iter().zip(stopped.iter()) {
            assert_eq!(b.speed_ms, 0.0);
            assert_eq!(a.angle_rad, b.angle_rad);
        }
        assert!(kin.module_turn_rates().iter().all(|r| *r == 0.0));
    }

    #[test]
    fn test_turn_rates_finite() {
        let mut kin = square_kinematics();

        // Translation cancels rotation exactly at the left front module
        let omega = 2.0;
        let motion = ChassisMotion::new(omega * HALF_SIDE_M, -omega * HALF_SIDE_M, omega);
        let setpoints = kin.to_module_setpoints(&motion, 0.0, ControlCentricity::RobotCentric);

        assert_eq!(setpoints[0].speed_ms, 0.0);
        assert!(kin.module_turn_rates().iter().all(|r| r.is_finite()));
    }

    #[test]
    fn test_desaturate() {
        let mut setpoints: Vec<ModuleSetpoint> = [5.0, 3.0, 4.0, 2.0]
            .iter()
            .map(|s| ModuleSetpoint {
                speed_ms: *s,
                angle_rad: 0.0,
            })
            .collect();

        assert!(desaturate(&mut setpoints, 4.0));

        for (sp, expected) in setpoints.iter().zip([4.0, 2.4, 3.2, 1.6].iter()) {
            assert_abs_diff_eq!(sp.speed_ms, *expected, epsilon = 1e-12);
        }

        assert!(!desaturate(&mut setpoints, 4.0));
    }
}
