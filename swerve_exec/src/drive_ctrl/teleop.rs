//! Teleoperated and autonomous driving

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;

use super::*;
use crate::{goal::FollowerOutput, kinematics::ChassisMotion};

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveCtrl {
    /// Drive from the operator's demands, holding heading when not rotating.
    pub(crate) fn teleop(&mut self, input: &InputData) -> DriveDem {
        let velocity_ms = self.throttle_map.lookup(input.operator.move_request());
        let direction_rad = input.operator.move_direction_rad();

        let rotate_rads = self.rotate.calculate(
            input.imu.yaw_rad,
            input.imu.yaw_rate_rads,
            input.operator.rotate,
        );

        self.track_aim_controllers(input.pose.heading_rad);

        let motion = ChassisMotion::new(
            velocity_ms * direction_rad.cos(),
            velocity_ms * direction_rad.sin(),
            rotate_rads,
        );

        self.drive(input, self.centricity, &motion)
    }

    /// Turn on the spot towards the target set on entry.
    pub(crate) fn turn_by(&mut self, input: &InputData) -> DriveDem {
        let rotate_rads = self
            .rotate
            .calculate_to(input.imu.yaw_rad, self.turn_target_rad);

        self.drive(input, self.centricity, &ChassisMotion::new(0.0, 0.0, rotate_rads))
    }

    /// Apply robot relative motion from autonomy.
    pub(crate) fn auto_drive(&mut self, input: &InputData, motion: &ChassisMotion) -> DriveDem {
        let dem = self.drive_robot_centric(input, motion);

        // Keep the heading controllers current for when the operator takes over
        self.rotate
            .calculate(input.imu.yaw_rad, input.imu.yaw_rate_rads, 0.0);
        self.track_aim_controllers(input.pose.heading_rad);

        dem
    }

    /// Follow the goal's approach path, holding position once it is reached.
    pub(crate) fn go_to_goal(&mut self, input: &InputData) -> Vec<DriveDem> {
        match self.follower.follow(&input.pose, &input.measured_motion) {
            FollowerOutput::Drive(motion) => vec![self.auto_drive(input, &motion)],
            FollowerOutput::GoalReached => {
                info!("Goal reached at {:?}", input.pose.to_array());
                self.report.goal_reached = true;

                self.rotate.reset(input.imu.yaw_rad);
                self.reset_controllers(input);
                self.set_mode(DriveMode::Teleop);

                vec![DriveDem::Stop]
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::super::state::test::{drive_ctrl, params, setpoints};
    use super::*;
    use crate::geom::Pose;
    use approx::assert_abs_diff_eq;
    use comms_if::tc::drive::OperatorInput;
    use util::module::State;

    #[test]
    fn test_teleop_full_forward() {
        let mut ctrl = drive_ctrl(params());
        let mut input = InputData::default();
        ctrl.enter(DriveMode::Teleop, &input).unwrap();

        input.operator = OperatorInput::new(1.0, 0.0, 0.0);
        let (dems, _) = ctrl.proc(&input).unwrap();

        assert_eq!(dems.len(), 1);
        for s in setpoints(&dems[0]) {
            assert_abs_diff_eq!(s.speed_ms, 4.3, epsilon = 1e-9);
            assert_abs_diff_eq!(s.angle_rad, 0.0, epsilon = 1e-9);
        }

        // Traction inputs accompany operator driving
        assert!(matches!(dems[0], DriveDem::Set { traction: Some(_), .. }));
    }

    #[test]
    fn test_teleop_deadband_holds_still() {
        let mut ctrl = drive_ctrl(params());
        let mut input = InputData::default();
        ctrl.enter(DriveMode::Teleop, &input).unwrap();

        input.operator = OperatorInput::new(0.05, -0.05, 0.05);
        let (dems, _) = ctrl.proc(&input).unwrap();

        for s in setpoints(&dems[0]) {
            assert_eq!(s.speed_ms, 0.0);
        }
    }

    #[test]
    fn test_red_alliance_flips_field_frame() {
        let mut ctrl = drive_ctrl(params());
        let mut input = InputData::default();
        input.alliance = Some(comms_if::alliance::Alliance::Red);
        ctrl.enter(DriveMode::Teleop, &input).unwrap();

        input.operator = OperatorInput::new(1.0, 0.0, 0.0);
        let (dems, _) = ctrl.proc(&input).unwrap();

        // Field +X demand with the frame turned half a turn points the modules backwards
        for s in setpoints(&dems[0]) {
            assert_abs_diff_eq!(s.angle_rad.abs(), std::f64::consts::PI, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_turn_by() {
        let mut ctrl = drive_ctrl(params());
        let mut input = InputData::default();
        input.imu.yaw_rad = 1.0;
        ctrl.enter(DriveMode::TurnBy { angle_rad: 0.5 }, &input)
            .unwrap();

        let (dems, _) = ctrl.proc(&input).unwrap();

        // Pure rotation, anticlockwise, so the front left module drives towards -X
        let s = setpoints(&dems[0]);
        assert!(s[0].speed_ms > 0.0);
        assert_abs_diff_eq!(s[0].angle_rad, 3.0 * std::f64::consts::FRAC_PI_4, epsilon = 1e-6);
    }

    #[test]
    fn test_auto_is_robot_centric() {
        let mut ctrl = drive_ctrl(params());
        let mut input = InputData::default();
        input.pose = Pose::new(0.0, 0.0, 1.0);
        ctrl.enter(DriveMode::Auto, &input).unwrap();

        input.auto_motion = Some(ChassisMotion::new(1.0, 0.0, 0.0));
        let (dems, _) = ctrl.proc(&input).unwrap();

        for s in setpoints(&dems[0]) {
            assert_abs_diff_eq!(s.speed_ms, 1.0, epsilon = 1e-9);
            assert_abs_diff_eq!(s.angle_rad, 0.0, epsilon = 1e-9);
        }
        assert!(matches!(dems[0], DriveDem::Set { traction: None, .. }));

        // No motion from autonomy means standing still
        input.auto_motion = None;
        let (dems, _) = ctrl.proc(&input).unwrap();
        for s in setpoints(&dems[0]) {
            assert_eq!(s.speed_ms, 0.0);
        }
    }
}
