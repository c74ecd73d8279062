//! # Telecommand processor module
//!
//! The telecommand processor handles TCs from any source. Commands which only change held intent
//! are written straight into the data store, everything else is queued as a [`DriveRequest`] for
//! the main loop to carry out, in order, against the controller and estimator.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use nalgebra::Vector2;

// Internal
use crate::{
    data_store::{DataStore, DriveRequest},
    drive_ctrl::{DriveCtrl, DriveMode},
    geom::Pose,
    goal::AllianceGoal,
    kinematics::ChassisMotion,
    loc::PoseEstimator,
};
use comms_if::tc::Tc;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to different modules.
pub fn exec(ds: &mut DataStore, tc: &Tc) {
    debug!("Executing TC {:?}", tc);

    let request = match tc {
        Tc::Operator(input) => {
            ds.operator = *input;
            return;
        }
        Tc::AutoMotion(m) => {
            ds.auto_motion = Some(ChassisMotion::new(m[0], m[1], m[2]));
            return;
        }
        Tc::Teleop => DriveRequest::Enter(DriveMode::Teleop),
        Tc::AimAtPoint {
            target_m,
            reversed,
            velocity_correction,
        } => DriveRequest::Enter(DriveMode::AimAtPoint {
            target_m: target_m.map(|t| Vector2::new(t[0], t[1])),
            reversed: *reversed,
            velocity_correction: *velocity_correction,
            centricity: None,
        }),
        Tc::TurnBy { angle_rad } => DriveRequest::Enter(DriveMode::TurnBy {
            angle_rad: *angle_rad,
        }),
        Tc::Snap => DriveRequest::Enter(DriveMode::Snap),
        Tc::AntiTip => DriveRequest::Enter(DriveMode::AntiTip),
        Tc::Auto => DriveRequest::Enter(DriveMode::Auto),
        Tc::GoToGoal(spec) => match AllianceGoal::from_spec(spec) {
            Ok(goal) => DriveRequest::Enter(DriveMode::GoToGoal(goal)),
            Err(e) => {
                warn!("Rejecting GoToGoal TC: {}", e);
                return;
            }
        },
        Tc::Stop => DriveRequest::Stop,
        Tc::Lock => DriveRequest::Lock,
        Tc::ToggleCentricity => DriveRequest::ToggleCentricity,
        Tc::EnableTractionControl => DriveRequest::SetTractionControl(true),
        Tc::DisableTractionControl => DriveRequest::SetTractionControl(false),
        Tc::ToggleTractionControl => DriveRequest::ToggleTractionControl,
        Tc::ResetPose(p) => DriveRequest::ResetPose(Pose::from_array(*p)),
        Tc::ResetPoseToVision => DriveRequest::ResetPoseToVision,
    };

    ds.pending_requests.push(request);
}

/// Carry out all pending requests in the order they were made.
///
/// Must be called after `ds.drive_ctrl_input` has been filled for this cycle. Demands from mode
/// changes go into `ds.tc_dems`, and a pose reset is written back into the drive control input.
pub fn carry_out_requests(ds: &mut DataStore, drive_ctrl: &mut DriveCtrl, estimator: &mut PoseEstimator) {
    for request in std::mem::take(&mut ds.pending_requests) {
        let input = &ds.drive_ctrl_input;

        match request {
            DriveRequest::Enter(mode) => match drive_ctrl.enter(mode, input) {
                Ok(dems) => ds.tc_dems.extend(dems),
                Err(e) => warn!("Could not change drive mode: {}", e),
            },
            DriveRequest::Stop => {
                let dems = drive_ctrl.stop(input);
                ds.tc_dems.extend(dems);
            }
            DriveRequest::Lock => {
                let dems = drive_ctrl.lock(input);
                ds.tc_dems.extend(dems);
            }
            DriveRequest::ToggleCentricity => drive_ctrl.toggle_centricity(),
            DriveRequest::SetTractionControl(enabled) => {
                ds.tc_dems.push(drive_ctrl.set_traction_control(enabled))
            }
            DriveRequest::ToggleTractionControl => {
                ds.tc_dems.push(drive_ctrl.toggle_traction_control())
            }
            DriveRequest::ResetPose(pose) => match estimator.reset_pose(pose) {
                Ok(()) => ds.drive_ctrl_input.pose = estimator.estimate(),
                Err(e) => warn!("Could not reset the pose: {}", e),
            },
            DriveRequest::ResetPoseToVision => match estimator.reset_to_vision() {
                Ok(true) => ds.drive_ctrl_input.pose = estimator.estimate(),
                Ok(false) => (),
                Err(e) => warn!("Could not reset the pose to vision: {}", e),
            },
        }
    }
}
