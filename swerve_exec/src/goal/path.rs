//! # Approach paths
//!
//! This module defines the short paths produced by goals and the interface to the path follower
//! which drives them.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::GoalError;
use crate::{geom::Pose, kinematics::ChassisMotion};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Velocity and acceleration limits applied when following a path.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathConstraints {
    /// Units: meters/second
    pub max_velocity_ms: f64,

    /// Units: meters/second^2
    pub max_acceleration_mss: f64,

    /// Units: radians/second
    pub max_angular_velocity_rads: f64,

    /// Units: radians/second^2
    pub max_angular_acceleration_radss: f64,
}

/// A straight path between two poses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproachPath {
    /// The first point is where the path starts, the last is the goal.
    pub points: Vec<Pose>,

    pub constraints: PathConstraints,

    /// Heading the robot should hold when it arrives, at zero velocity.
    ///
    /// Units: radians
    pub end_heading_rad: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Output of one cycle of path following.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FollowerOutput {
    /// Robot relative motion to apply this cycle.
    Drive(ChassisMotion),

    /// The end of the path has been reached.
    GoalReached,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A path following collaborator.
///
/// Once started the follower is ticked once per cycle until it reports the goal has been reached
/// or it is cancelled.
pub trait PathFollower {
    /// Begin following a new path from the given pose, replacing any previous path.
    fn start(&mut self, path: &ApproachPath, pose: &Pose);

    /// Compute this cycle's motion from the estimated pose and the measured robot relative motion.
    fn follow(&mut self, pose: &Pose, measured: &ChassisMotion) -> FollowerOutput;

    /// Abandon the current path.
    fn cancel(&mut self);

    /// Whether a path is currently being followed.
    fn is_active(&self) -> bool;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PathConstraints {
    pub fn new(
        max_velocity_ms: f64,
        max_acceleration_mss: f64,
        max_angular_velocity_rads: f64,
        max_angular_acceleration_radss: f64,
    ) -> Result<Self, GoalError> {
        let constraints = Self {
            max_velocity_ms,
            max_acceleration_mss,
            max_angular_velocity_rads,
            max_angular_acceleration_radss,
        };

        constraints.validate()?;

        Ok(constraints)
    }

    /// Check every limit is positive and finite.
    pub fn validate(&self) -> Result<(), GoalError> {
        let limits = [
            self.max_velocity_ms,
            self.max_acceleration_mss,
            self.max_angular_velocity_rads,
            self.max_angular_acceleration_radss,
        ];

        if limits.iter().all(|l| l.is_finite() && *l > 0.0) {
            Ok(())
        }
        else {
            Err(GoalError::InvalidConstraints(*self))
        }
    }
}

impl ApproachPath {
    /// Produce a direct path between the two poses.
    pub fn direct(from: Pose, to: Pose, constraints: PathConstraints, end_heading_rad: f64) -> Self {
        Self {
            points: vec![from, to],
            constraints,
            end_heading_rad,
        }
    }

    pub fn start(&self) -> Option<&Pose> {
        self.points.first()
    }

    pub fn end(&self) -> Option<&Pose> {
        self.points.last()
    }

    /// Return the length of the path.
    ///
    /// Units: meters
    pub fn length_m(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum()
    }

    /// The point the given distance along the path, clamped to its ends.
    ///
    /// Returns `None` if the path has no points.
    pub fn point_at(&self, distance_m: f64) -> Option<Vector2<f64>> {
        let mut remaining_m = distance_m.max(0.0);

        for w in self.points.windows(2) {
            let seg = w[1].position_m - w[0].position_m;
            let seg_len_m = seg.norm();

            if remaining_m <= seg_len_m && seg_len_m > 0.0 {
                return Some(w[0].position_m + seg * (remaining_m / seg_len_m));
            }

            remaining_m -= seg_len_m;
        }

        self.end().map(|p| p.position_m)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn constraints() -> PathConstraints {
        PathConstraints::new(3.0, 1.0, 12.0, 4.0).unwrap()
    }

    #[test]
    fn test_invalid_constraints() {
        assert_eq!(
            PathConstraints::new(3.0, 0.0, 12.0, 4.0),
            Err(GoalError::InvalidConstraints(PathConstraints {
                max_velocity_ms: 3.0,
                max_acceleration_mss: 0.0,
                max_angular_velocity_rads: 12.0,
                max_angular_acceleration_radss: 4.0,
            }))
        );
        assert!(PathConstraints::new(f64::INFINITY, 1.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_point_at() {
        let path = ApproachPath::direct(
            Pose::new(1.0, 1.0, 0.0),
            Pose::new(1.0, 3.0, 0.0),
            constraints(),
            0.0,
        );

        assert_abs_diff_eq!(path.length_m(), 2.0);

        let mid = path.point_at(0.5).unwrap();
        assert_abs_diff_eq!(mid[0], 1.0);
        assert_abs_diff_eq!(mid[1], 1.5);

        let past_end = path.point_at(10.0).unwrap();
        assert_abs_diff_eq!(past_end[1], 3.0);
    }
}
