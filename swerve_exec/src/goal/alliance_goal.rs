//! Alliance relative goals

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;

use super::{ApproachPath, GoalError, PathConstraints};
use crate::geom::Pose;
use comms_if::{
    alliance::{Alliance, AllianceSource},
    tc::GoalSpec,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A goal pose which depends on the robot's alliance.
#[derive(Debug, Clone, PartialEq)]
pub struct AllianceGoal {
    blue: GoalSide,
    red: GoalSide,

    /// Units: meters
    approach_distance_m: f64,

    /// True if the robot's rear faces the goal on arrival.
    is_reversed: bool,
}

/// The poses and path for one alliance.
#[derive(Debug, Clone, PartialEq)]
struct GoalSide {
    goal: Pose,
    final_approach: Pose,
    path: Option<ApproachPath>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AllianceGoal {
    /// Create a new goal from the pose to use on each alliance.
    ///
    /// [`AllianceGoal::prepare`] must be called before the approach path can be used.
    pub fn new(
        blue_pose: Pose,
        red_pose: Pose,
        approach_distance_m: f64,
        is_reversed: bool,
    ) -> Result<Self, GoalError> {
        if !blue_pose.is_finite()
            || !red_pose.is_finite()
            || !approach_distance_m.is_finite()
            || approach_distance_m < 0.0
        {
            return Err(GoalError::InvalidGoal);
        }

        Ok(Self {
            blue: GoalSide::new(blue_pose, approach_distance_m, is_reversed),
            red: GoalSide::new(red_pose, approach_distance_m, is_reversed),
            approach_distance_m,
            is_reversed,
        })
    }

    /// Create a goal which is the same for both alliances.
    pub fn shared(pose: Pose, approach_distance_m: f64, is_reversed: bool) -> Result<Self, GoalError> {
        Self::new(pose, pose, approach_distance_m, is_reversed)
    }

    /// Create a goal from a telecommand.
    pub fn from_spec(spec: &GoalSpec) -> Result<Self, GoalError> {
        Self::new(
            Pose::from_array(spec.blue_pose),
            Pose::from_array(spec.red_pose),
            spec.approach_distance_m,
            spec.reversed,
        )
    }

    /// Build the approach paths for both alliances.
    pub fn prepare(&mut self, constraints: &PathConstraints) -> Result<(), GoalError> {
        constraints.validate()?;

        self.blue.prepare(constraints);
        self.red.prepare(constraints);

        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.blue.path.is_some() && self.red.path.is_some()
    }

    /// Units: meters
    pub fn approach_distance_m(&self) -> f64 {
        self.approach_distance_m
    }

    pub fn is_reversed(&self) -> bool {
        self.is_reversed
    }

    /// The goal pose for the current alliance.
    pub fn goal_pose<A: AllianceSource + ?Sized>(&self, alliance: &A) -> Result<Pose, GoalError> {
        Ok(self.side(alliance)?.goal)
    }

    /// The final approach pose for the current alliance.
    pub fn final_approach_pose<A: AllianceSource + ?Sized>(
        &self,
        alliance: &A,
    ) -> Result<Pose, GoalError> {
        Ok(self.side(alliance)?.final_approach)
    }

    /// The path from the final approach pose into the goal for the current alliance.
    pub fn final_approach_path<A: AllianceSource + ?Sized>(
        &self,
        alliance: &A,
    ) -> Result<&ApproachPath, GoalError> {
        if !self.is_prepared() {
            return Err(GoalError::NotPrepared);
        }

        self.side(alliance)?
            .path
            .as_ref()
            .ok_or(GoalError::NotPrepared)
    }

    fn side<A: AllianceSource + ?Sized>(&self, alliance: &A) -> Result<&GoalSide, GoalError> {
        match alliance.alliance() {
            Some(Alliance::Blue) => Ok(&self.blue),
            Some(Alliance::Red) => Ok(&self.red),
            None => Err(GoalError::AllianceIndeterminate),
        }
    }
}

impl GoalSide {
    fn new(goal: Pose, approach_distance_m: f64, is_reversed: bool) -> Self {
        // Approach from behind the goal unless the robot reverses in
        let direction_rad = if is_reversed {
            goal.heading_rad
        }
        else {
            goal.heading_rad + std::f64::consts::PI
        };

        let offset_m = Vector2::new(direction_rad.cos(), direction_rad.sin()) * approach_distance_m;

        Self {
            goal,
            final_approach: Pose {
                position_m: goal.position_m + offset_m,
                heading_rad: goal.heading_rad,
            },
            path: None,
        }
    }

    fn prepare(&mut self, constraints: &PathConstraints) {
        self.path = Some(ApproachPath::direct(
            self.final_approach,
            self.goal,
            *constraints,
            self.final_approach.heading_rad,
        ));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn constraints() -> PathConstraints {
        PathConstraints::new(3.0, 1.0, 12.0, 4.0).unwrap()
    }

    fn assert_pose(pose: Pose, expected: [f64; 3]) {
        assert_abs_diff_eq!(pose.x_m(), expected[0], epsilon = 1e-12);
        assert_abs_diff_eq!(pose.y_m(), expected[1], epsilon = 1e-12);
        assert_abs_diff_eq!(pose.heading_rad, expected[2], epsilon = 1e-12);
    }

    #[test]
    fn test_final_approach_pose() {
        let blue = Some(Alliance::Blue);

        let goal = AllianceGoal::shared(Pose::new(5.0, 5.0, 0.0), 1.0, false).unwrap();
        assert_pose(goal.final_approach_pose(&blue).unwrap(), [4.0, 5.0, 0.0]);

        let goal = AllianceGoal::shared(Pose::new(5.0, 5.0, 0.0), 1.0, true).unwrap();
        assert_pose(goal.final_approach_pose(&blue).unwrap(), [6.0, 5.0, 0.0]);
    }

    #[test]
    fn test_alliance_selects_pose() {
        let goal = AllianceGoal::new(
            Pose::new(1.0, 2.0, 0.0),
            Pose::new(15.0, 2.0, std::f64::consts::PI),
            0.5,
            false,
        )
        .unwrap();

        assert_pose(goal.goal_pose(&Some(Alliance::Red)).unwrap(), [15.0, 2.0, std::f64::consts::PI]);
        // Red faces -X so its approach is from +X
        assert_pose(
            goal.final_approach_pose(&Some(Alliance::Red)).unwrap(),
            [15.5, 2.0, std::f64::consts::PI],
        );
        assert_eq!(
            goal.goal_pose(&None::<Alliance>),
            Err(GoalError::AllianceIndeterminate)
        );
    }

    #[test]
    fn test_path_requires_prepare() {
        let mut goal = AllianceGoal::shared(Pose::new(5.0, 5.0, 0.0), 1.0, false).unwrap();

        // Not prepared takes priority over an unknown alliance
        assert_eq!(
            goal.final_approach_path(&None::<Alliance>),
            Err(GoalError::NotPrepared)
        );

        goal.prepare(&constraints()).unwrap();

        assert_eq!(
            goal.final_approach_path(&None::<Alliance>),
            Err(GoalError::AllianceIndeterminate)
        );

        let path = goal.final_approach_path(&Some(Alliance::Blue)).unwrap();
        assert_pose(*path.start().unwrap(), [4.0, 5.0, 0.0]);
        assert_pose(*path.end().unwrap(), [5.0, 5.0, 0.0]);
        assert_abs_diff_eq!(path.length_m(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_goal() {
        assert_eq!(
            AllianceGoal::shared(Pose::new(f64::NAN, 0.0, 0.0), 1.0, false),
            Err(GoalError::InvalidGoal)
        );
        assert_eq!(
            AllianceGoal::shared(Pose::default(), -1.0, false),
            Err(GoalError::InvalidGoal)
        );
    }
}
