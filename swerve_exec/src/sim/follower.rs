//! Straight line path follower
//!
//! Drives directly at each point of the path in turn, moving on once within tolerance of a point.
//! Speed is limited so the robot can always stop at the end of the path at the path's
//! acceleration limit, and the heading is driven to the path's end heading throughout.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;

// Internal
use crate::{
    geom::Pose,
    goal::{ApproachPath, FollowerOutput, PathFollower},
    kinematics::ChassisMotion,
};
use util::maths::wrap_angle;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Follows a path as a series of straight lines.
#[derive(Debug, Clone)]
pub struct LineFollower {
    /// Units: seconds
    period_s: f64,

    /// Units: meters
    position_tolerance_m: f64,

    /// Units: radians
    heading_tolerance_rad: f64,

    /// Heading correction gain.
    ///
    /// Units: 1/seconds
    heading_kp: f64,

    /// The path being followed, beginning at the pose the follower was started from.
    path: Option<ApproachPath>,

    target_index: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LineFollower {
    pub fn new(
        period_s: f64,
        position_tolerance_m: f64,
        heading_tolerance_rad: f64,
        heading_kp: f64,
    ) -> Self {
        Self {
            period_s,
            position_tolerance_m,
            heading_tolerance_rad,
            heading_kp,
            path: None,
            target_index: 0,
        }
    }

    /// Distance left along the path from the pose, through the current target.
    ///
    /// Units: meters
    fn remaining_m(&self, path: &ApproachPath, pose: &Pose) -> f64 {
        let to_target = pose.distance_to(&path.points[self.target_index]);

        to_target
            + path.points[self.target_index..]
                .windows(2)
                .map(|w| w[0].distance_to(&w[1]))
                .sum::<f64>()
    }
}

impl PathFollower for LineFollower {
    fn start(&mut self, path: &ApproachPath, pose: &Pose) {
        let mut path = path.clone();
        path.points.insert(0, *pose);

        self.target_index = 1;
        self.path = Some(path);
    }

    fn follow(&mut self, pose: &Pose, measured: &ChassisMotion) -> FollowerOutput {
        let path = match self.path.take() {
            Some(p) => p,
            None => return FollowerOutput::GoalReached,
        };
        let last_index = path.points.len() - 1;

        // Move on from targets we have reached or passed
        while self.target_index < last_index
            && (pose.distance_to(&path.points[self.target_index]) < self.position_tolerance_m
                || passed(&path.points[self.target_index - 1], &path.points[self.target_index], pose))
        {
            self.target_index += 1;
            debug!("LineFollower now targeting point {}", self.target_index);
        }

        let target = path.points[self.target_index];
        let heading_error_rad = wrap_angle(path.end_heading_rad - pose.heading_rad);

        if self.target_index == last_index
            && pose.distance_to(&target) < self.position_tolerance_m
            && heading_error_rad.abs() < self.heading_tolerance_rad
        {
            return FollowerOutput::GoalReached;
        }

        let c = &path.constraints;
        let remaining_m = self.remaining_m(&path, pose);

        let speed_ms = c
            .max_velocity_ms
            .min((2.0 * c.max_acceleration_mss * remaining_m).sqrt())
            .min(measured.speed_ms() + c.max_acceleration_mss * self.period_s);

        let bearing_rad = pose.bearing_to(&target.position_m);
        let omega_rads = (self.heading_kp * heading_error_rad)
            .clamp(-c.max_angular_velocity_rads, c.max_angular_velocity_rads);

        let field_motion = ChassisMotion::new(
            speed_ms * bearing_rad.cos(),
            speed_ms * bearing_rad.sin(),
            omega_rads,
        );

        self.path = Some(path);

        FollowerOutput::Drive(field_motion.rotated(-pose.heading_rad))
    }

    fn cancel(&mut self) {
        self.path = None;
    }

    fn is_active(&self) -> bool {
        self.path.is_some()
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// True if the pose is level with or beyond `target` along the segment from `prev`.
fn passed(prev: &Pose, target: &Pose, pose: &Pose) -> bool {
    let segment = target.position_m - prev.position_m;
    (pose.position_m - target.position_m).dot(&segment) >= 0.0
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::goal::PathConstraints;
    use approx::assert_abs_diff_eq;

    fn path() -> ApproachPath {
        ApproachPath::direct(
            Pose::new(1.0, 0.0, 0.0),
            Pose::new(2.0, 0.0, 0.0),
            PathConstraints::new(3.0, 1.0, 6.0, 12.0).unwrap(),
            0.0,
        )
    }

    #[test]
    fn test_inactive_until_started() {
        let mut f = LineFollower::new(0.02, 0.02, 0.02, 3.0);

        assert!(!f.is_active());
        assert_eq!(
            f.follow(&Pose::default(), &ChassisMotion::default()),
            FollowerOutput::GoalReached
        );
    }

    #[test]
    fn test_accelerates_towards_path() {
        let mut f = LineFollower::new(0.02, 0.02, 0.02, 3.0);

        // Facing +Y, so the path ahead along +X is to the robot's right
        let pose = Pose::new(0.0, 0.0, std::f64::consts::FRAC_PI_2);
        f.start(&path(), &pose);
        assert!(f.is_active());

        match f.follow(&pose, &ChassisMotion::default()) {
            FollowerOutput::Drive(m) => {
                assert_abs_diff_eq!(m.vx_ms, 0.0, epsilon = 1e-9);
                assert_abs_diff_eq!(m.vy_ms, -0.02, epsilon = 1e-9);

                // Turning back to face +X
                assert!(m.omega_rads < 0.0);
            }
            o => panic!("expected drive, got {:?}", o),
        }

        f.cancel();
        assert!(!f.is_active());
    }

    #[test]
    fn test_reached_at_end() {
        let mut f = LineFollower::new(0.02, 0.02, 0.02, 3.0);
        f.start(&path(), &Pose::default());

        let at_end = Pose::new(1.995, 0.0, 0.01);
        assert_eq!(
            f.follow(&at_end, &ChassisMotion::default()),
            FollowerOutput::GoalReached
        );
        assert!(!f.is_active());
    }
}
