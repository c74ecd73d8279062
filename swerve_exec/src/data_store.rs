//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::{alliance::Alliance, tc::drive::OperatorInput};

use crate::{
    drive_ctrl::{self, DriveDem},
    drivetrain::DrivetrainData,
    geom::Pose,
    kinematics::ChassisMotion,
    loc,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Simulation elapsed time
    pub sim_time_s: f64,

    // Operator and autonomy intent, held between commands
    pub operator: OperatorInput,
    pub auto_motion: Option<ChassisMotion>,
    pub alliance: Option<Alliance>,

    /// Mode changes and resets requested by telecommands, carried out in order by the main loop
    /// once the cycle's input data is known.
    pub pending_requests: Vec<DriveRequest>,

    /// Demands raised by telecommands this cycle, applied before the controller's own.
    pub tc_dems: Vec<DriveDem>,

    // Sensing
    pub drivetrain_data: DrivetrainData,

    // Localisation
    pub loc_status_rpt: loc::StatusReport,
    pub odometry_pose: Pose,
    pub true_pose: Pose,

    /// Units: radians/second
    pub heading_rate_rads: f64,

    // DriveCtrl
    pub drive_ctrl_input: drive_ctrl::InputData,
    pub drive_ctrl_output: Vec<DriveDem>,
    pub drive_ctrl_status_rpt: drive_ctrl::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A request which needs the controller or estimator rather than just the data store.
#[derive(Debug, Clone, PartialEq)]
pub enum DriveRequest {
    Enter(drive_ctrl::DriveMode),
    Stop,
    Lock,
    ToggleCentricity,
    SetTractionControl(bool),
    ToggleTractionControl,
    ResetPose(Pose),
    ResetPoseToVision,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        let cycles_per_second = (cycle_frequency_hz as u128).max(1);
        self.is_1_hz_cycle = self.num_cycles % cycles_per_second == 0;

        self.tc_dems.clear();
        self.drive_ctrl_output.clear();
        self.drive_ctrl_status_rpt = drive_ctrl::StatusReport::default();
        self.loc_status_rpt = loc::StatusReport::default();
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        self.num_cycles += 1;
    }

    /// Assemble this cycle's drive control input from the estimate and the held intent.
    ///
    /// Must be called after the cycle's telecommands have been executed, so that new operator and
    /// autonomy demands take effect in the same cycle.
    pub fn update_drive_ctrl_input(
        &mut self,
        pose: Pose,
        travel_direction_rad: f64,
        measured_motion: ChassisMotion,
    ) {
        self.drive_ctrl_input = drive_ctrl::InputData {
            pose,
            travel_direction_rad,
            imu: self.drivetrain_data.imu,
            operator: self.operator,
            alliance: self.alliance,
            auto_motion: self.auto_motion,
            measured_motion,
        };
    }

    /// All demands for this cycle, in the order they are to be applied.
    pub fn cycle_dems(&self) -> Vec<DriveDem> {
        self.tc_dems
            .iter()
            .chain(self.drive_ctrl_output.iter())
            .cloned()
            .collect()
    }
}
