//! Recovery from tipping

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;

use super::*;
use crate::kinematics::ChassisMotion;
use comms_if::eqpt::imu::ImuData;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveCtrl {
    /// True if the robot is pitched or rolled past the tip threshold.
    pub(crate) fn is_tipping(&self, imu: &ImuData) -> bool {
        imu.pitch_rad.abs() > self.params.tip_threshold_rad
            || imu.roll_rad.abs() > self.params.tip_threshold_rad
    }

    /// True if the robot is level to within the balanced threshold on both axes.
    pub(crate) fn is_balanced(&self, imu: &ImuData) -> bool {
        imu.pitch_rad.abs() < self.params.balanced_threshold_rad
            && imu.roll_rad.abs() < self.params.balanced_threshold_rad
    }

    /// Drive towards the low side until level, then stop and lock.
    pub(crate) fn anti_tip(&mut self, input: &InputData) -> Vec<DriveDem> {
        if self.is_balanced(&input.imu) {
            info!("Robot balanced, leaving anti-tip");
            return self.exit(input);
        }

        let direction_rad = input.imu.roll_rad.atan2(input.imu.pitch_rad);
        let speed_ms = self.params.max_linear_speed_ms * self.params.anti_tip_speed_fraction;

        let motion = ChassisMotion::new(
            speed_ms * direction_rad.cos(),
            speed_ms * direction_rad.sin(),
            0.0,
        );

        vec![self.drive_robot_centric(input, &motion)]
    }
}

#[cfg(test)]
mod test {
    use super::super::state::test::{drive_ctrl, params, setpoints};
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;
    use util::module::State;

    #[test]
    fn test_enter_requires_tip() {
        let mut ctrl = drive_ctrl(params());
        let mut input = InputData::default();

        // Above balanced but below tipping
        input.imu.pitch_rad = 0.3;
        assert!(matches!(
            ctrl.enter(DriveMode::AntiTip, &input),
            Err(DriveCtrlError::NotTipping)
        ));
        assert_eq!(ctrl.mode(), &DriveMode::Idle);
    }

    #[test]
    fn test_drives_down_then_locks() {
        let mut ctrl = drive_ctrl(params());
        let mut input = InputData::default();

        // Rolled left side up
        input.imu.roll_rad = 0.7;
        ctrl.enter(DriveMode::AntiTip, &input).unwrap();

        let (dems, _) = ctrl.proc(&input).unwrap();
        assert_eq!(dems.len(), 1);
        for s in setpoints(&dems[0]) {
            assert_abs_diff_eq!(s.speed_ms, 4.3 * 0.25, epsilon = 1e-9);
            assert_abs_diff_eq!(s.angle_rad, FRAC_PI_2, epsilon = 1e-9);
        }
        assert!(matches!(dems[0], DriveDem::Set { traction: None, .. }));

        // Recovering, still driving
        input.imu.roll_rad = 0.3;
        let (dems, report) = ctrl.proc(&input).unwrap();
        assert_eq!(dems.len(), 1);
        assert_eq!(report.mode, ModeKind::AntiTip);

        input.imu.roll_rad = 0.05;
        let (dems, report) = ctrl.proc(&input).unwrap();
        assert_eq!(dems, vec![DriveDem::Stop, DriveDem::Lock]);
        assert_eq!(report.mode, ModeKind::Idle);
    }

    #[test]
    fn test_interrupted_still_locks() {
        let mut ctrl = drive_ctrl(params());
        let mut input = InputData::default();
        input.imu.pitch_rad = -0.8;
        ctrl.enter(DriveMode::AntiTip, &input).unwrap();

        let dems = ctrl.enter(DriveMode::Teleop, &input).unwrap();

        assert_eq!(dems, vec![DriveDem::Stop, DriveDem::Lock]);
    }

    #[test]
    fn test_auto_anti_tip() {
        let mut p = params();
        p.auto_anti_tip = true;
        let mut ctrl = drive_ctrl(p);
        let mut input = InputData::default();
        ctrl.enter(DriveMode::Teleop, &input).unwrap();

        input.imu.pitch_rad = 0.8;
        let (dems, report) = ctrl.proc(&input).unwrap();

        // Leaving teleop stops, then the first anti-tip demand drives forwards
        assert_eq!(dems[0], DriveDem::Stop);
        for s in setpoints(&dems[1]) {
            assert_abs_diff_eq!(s.angle_rad, 0.0, epsilon = 1e-9);
        }
        assert_eq!(report.mode, ModeKind::AntiTip);
    }
}
