//! Wheel odometry

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::LocError;
use crate::{
    geom::Pose,
    kinematics::{ForwardKinematics, KinematicsError},
};
use comms_if::eqpt::module::ModulePosition;
use util::maths::wrap_angle;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Dead reckoning from module distances and the gyro.
///
/// Translation comes from the modules, heading from the gyro. A gyro offset is kept so that the
/// odometry can be reset to any heading without touching the gyro.
#[derive(Debug, Clone)]
pub struct Odometry {
    kinematics: ForwardKinematics,

    pose: Pose,

    /// Units: radians
    prev_heading_rad: f64,

    /// Added to the gyro yaw to give the field heading.
    ///
    /// Units: radians
    gyro_offset_rad: f64,

    prev_positions: Vec<ModulePosition>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Odometry {
    pub fn new(
        kinematics: ForwardKinematics,
        gyro_yaw_rad: f64,
        positions: &[ModulePosition],
        initial_pose: Pose,
    ) -> Result<Self, LocError> {
        let mut odom = Self {
            kinematics,
            pose: Pose::default(),
            prev_heading_rad: 0.0,
            gyro_offset_rad: 0.0,
            prev_positions: Vec::new(),
        };

        odom.reset(gyro_yaw_rad, positions, initial_pose)?;

        Ok(odom)
    }

    /// Reset the odometry so that the robot is at `pose` with the given gyro and module readings.
    pub fn reset(
        &mut self,
        gyro_yaw_rad: f64,
        positions: &[ModulePosition],
        pose: Pose,
    ) -> Result<(), LocError> {
        if !pose.is_finite() {
            return Err(LocError::NonFiniteResetPose);
        }

        // Validates the number of modules before anything is changed
        self.kinematics.to_twist(positions)?;

        self.pose = pose;
        self.prev_heading_rad = pose.heading_rad;
        self.gyro_offset_rad = pose.heading_rad - gyro_yaw_rad;
        self.prev_positions = positions.to_vec();

        Ok(())
    }

    /// Integrate new gyro and module readings, returning the new pose.
    pub fn update(
        &mut self,
        gyro_yaw_rad: f64,
        positions: &[ModulePosition],
    ) -> Result<Pose, LocError> {
        if positions.len() != self.prev_positions.len() {
            return Err(KinematicsError::ModuleCountMismatch {
                expected: self.prev_positions.len(),
                found: positions.len(),
            }
            .into());
        }

        let heading_rad = wrap_angle(gyro_yaw_rad + self.gyro_offset_rad);

        let deltas: Vec<ModulePosition> = positions
            .iter()
            .zip(self.prev_positions.iter())
            .map(|(curr, prev)| ModulePosition {
                distance_m: curr.distance_m - prev.distance_m,
                angle_rad: curr.angle_rad,
            })
            .collect();

        let mut twist = self.kinematics.to_twist(&deltas)?;
        twist.dtheta_rad = wrap_angle(heading_rad - self.prev_heading_rad);

        let new_pose = self.pose.exp(&twist);

        self.prev_heading_rad = heading_rad;
        self.prev_positions = positions.to_vec();
        self.pose = Pose {
            position_m: new_pose.position_m,
            heading_rad,
        };

        Ok(self.pose)
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn kinematics(&self) -> &ForwardKinematics {
        &self.kinematics
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kinematics::ModuleGeometry;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    fn fk() -> ForwardKinematics {
        ForwardKinematics::new(
            ModuleGeometry::from_arrays(&[[0.3, 0.3], [0.3, -0.3], [-0.3, 0.3], [-0.3, -0.3]])
                .unwrap(),
        )
        .unwrap()
    }

    fn positions(distance_m: f64, angle_rad: f64) -> Vec<ModulePosition> {
        vec![
            ModulePosition {
                distance_m,
                angle_rad
            };
            4
        ]
    }

    #[test]
    fn test_straight_line() {
        let mut odom = Odometry::new(fk(), 0.0, &positions(0.0, 0.0), Pose::default()).unwrap();

        odom.update(0.0, &positions(0.5, 0.0)).unwrap();
        let pose = odom.update(0.0, &positions(1.0, 0.0)).unwrap();

        assert_abs_diff_eq!(pose.x_m(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pose.y_m(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reset_heading_offset() {
        // Gyro reads 0.3 but the robot is placed facing field +Y
        let mut odom = Odometry::new(
            fk(),
            0.3,
            &positions(2.0, 0.0),
            Pose::new(1.0, 1.0, FRAC_PI_2),
        )
        .unwrap();

        let pose = odom.update(0.3, &positions(3.0, 0.0)).unwrap();

        // Driving robot forwards is driving field +Y
        assert_abs_diff_eq!(pose.x_m(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pose.y_m(), 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pose.heading_rad, FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_wrong_module_count() {
        let mut odom = Odometry::new(fk(), 0.0, &positions(0.0, 0.0), Pose::default()).unwrap();

        assert!(odom.update(0.0, &positions(1.0, 0.0)[..3]).is_err());
        assert!(odom
            .reset(0.0, &positions(1.0, 0.0)[..2], Pose::default())
            .is_err());
    }
}
