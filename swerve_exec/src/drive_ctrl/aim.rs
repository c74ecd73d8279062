//! Aiming and snapping the robot's heading

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use std::f64::consts::PI;

use super::*;
use crate::kinematics::{ChassisMotion, ControlCentricity};
use comms_if::alliance::Alliance;
use util::maths::wrap_angle;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveCtrl {
    /// Translate as in teleop while turning the front (or rear) of the robot to face a point.
    pub(crate) fn aim_at_point(
        &mut self,
        input: &InputData,
        target_m: Option<Vector2<f64>>,
        reversed: bool,
        velocity_correction: bool,
        centricity: ControlCentricity,
    ) -> DriveDem {
        let velocity_ms = self.throttle_map.lookup(input.operator.move_request());
        let direction_rad = input.operator.move_direction_rad();
        let translation = ChassisMotion::new(
            velocity_ms * direction_rad.cos(),
            velocity_ms * direction_rad.sin(),
            0.0,
        );

        let point_m = target_m
            .map(|t| t + Vector2::new(self.params.aim_offset_m[0], self.params.aim_offset_m[1]));
        let pose = input.pose;

        let point_m = match point_m {
            Some(p) if (p - pose.position_m).norm() > f64::EPSILON => p,
            _ => {
                // Nothing to aim at, rotate on the operator's demand instead
                let rotate_rads = self.rotate.calculate(
                    input.imu.yaw_rad,
                    input.imu.yaw_rate_rads,
                    input.operator.rotate,
                );
                self.track_aim_controllers(pose.heading_rad);

                return self.drive(
                    input,
                    centricity,
                    &ChassisMotion {
                        omega_rads: rotate_rads,
                        ..translation
                    },
                );
            }
        };

        let target_vector = point_m - pose.position_m;

        // Lead the point by the part of the robot's motion across the line of sight
        let robot_vector = Vector2::new(
            velocity_ms * input.travel_direction_rad.cos(),
            velocity_ms * input.travel_direction_rad.sin(),
        );
        let parallel = target_vector * (robot_vector.dot(&target_vector) / target_vector.norm_squared());
        let fudge = if velocity_correction {
            self.params.aim_velocity_fudge
        }
        else {
            0.0
        };
        let perpendicular = (robot_vector - parallel) * fudge;

        let angle_rad = pose.bearing_to(&(point_m - perpendicular));

        let (measured_rad, rotate_rads) = if reversed {
            let measured_rad = wrap_angle(pose.heading_rad + PI);
            (measured_rad, self.aim_back.calculate(measured_rad, angle_rad))
        }
        else {
            (
                pose.heading_rad,
                self.aim_front.calculate(pose.heading_rad, angle_rad),
            )
        };

        self.report.aim_error_rad = Some(wrap_angle(measured_rad - angle_rad));

        self.drive(
            input,
            centricity,
            &ChassisMotion {
                omega_rads: rotate_rads,
                ..translation
            },
        )
    }

    /// Translate as in teleop while holding the alliance's amp or source direction.
    ///
    /// The source direction is used when the robot is close to its alliance's source.
    pub(crate) fn snap(&mut self, input: &InputData) -> DriveDem {
        let velocity_ms = self.throttle_map.lookup(input.operator.move_request());
        let direction_rad = input.operator.move_direction_rad();

        let rotate_rads = match self.snap_direction_rad(input) {
            Some(target_rad) => self
                .aim_front
                .calculate(input.pose.heading_rad, target_rad),
            None => self
                .rotate
                .calculate(input.imu.yaw_rad, input.imu.yaw_rate_rads, 0.0),
        };

        let motion = ChassisMotion::new(
            velocity_ms * direction_rad.cos(),
            velocity_ms * direction_rad.sin(),
            rotate_rads,
        );

        self.drive(input, self.centricity, &motion)
    }

    /// Field direction to snap to, or `None` if the alliance is not known.
    ///
    /// Units: radians
    fn snap_direction_rad(&self, input: &InputData) -> Option<f64> {
        let p = &self.params;
        let (source_point_m, source_rad, amp_rad) = match input.alliance? {
            Alliance::Blue => (
                p.blue_source_point_m,
                p.blue_source_direction_rad,
                p.blue_amp_direction_rad,
            ),
            Alliance::Red => (
                p.red_source_point_m,
                p.red_source_direction_rad,
                p.red_amp_direction_rad,
            ),
        };

        let source_dist_m =
            (Vector2::new(source_point_m[0], source_point_m[1]) - input.pose.position_m).norm();

        if source_dist_m < p.snap_source_radius_m {
            Some(source_rad)
        }
        else {
            Some(amp_rad)
        }
    }
}
