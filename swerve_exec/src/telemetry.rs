//! # Telemetry
//!
//! Records the state of the drive each cycle into a [`TelemetrySink`]. The archive sink writes
//! one CSV row per record, `time_s, key, values...`, into the session's archive directory.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use std::path::Path;

// Internal
use crate::{data_store::DataStore, drive_ctrl::DriveDem};
use comms_if::tm::TelemetrySink;
use util::{archive::Archiver, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Telemetry sink writing to a CSV archive.
///
/// Write failures are logged once and otherwise ignored.
pub struct ArchiveTelemetry {
    archiver: Archiver,

    /// Timestamp attached to records.
    ///
    /// Units: seconds
    time_s: f64,

    write_failed: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArchiveTelemetry {
    /// Create a sink writing to `path` within the session's archive directory.
    pub fn new<P: AsRef<Path>>(session: &Session, path: P) -> Result<Self, csv::Error> {
        Ok(Self::from_archiver(Archiver::from_path(session, path)?))
    }

    pub fn from_archiver(archiver: Archiver) -> Self {
        Self {
            archiver,
            time_s: 0.0,
            write_failed: false,
        }
    }

    /// Set the time attached to subsequent records.
    pub fn set_time_s(&mut self, time_s: f64) {
        self.time_s = time_s;
    }
}

impl TelemetrySink for ArchiveTelemetry {
    fn record(&mut self, key: &str, values: &[f64]) {
        let mut row = Vec::with_capacity(values.len() + 2);
        row.push(format!("{:.3}", self.time_s));
        row.push(key.to_string());
        row.extend(values.iter().map(|v| v.to_string()));

        if let Err(e) = self.archiver.serialise(row) {
            if !self.write_failed {
                warn!("Could not write telemetry, further failures will not be logged: {}", e);
                self.write_failed = true;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Record one cycle of drive state.
pub fn record_cycle(sink: &mut dyn TelemetrySink, ds: &DataStore) {
    let pose = &ds.drive_ctrl_input.pose;

    sink.record("Drive/Pose", &pose.to_array());
    sink.record("Drive/OdometryPose", &ds.odometry_pose.to_array());
    sink.record("Drive/TrueRobotPose", &ds.true_pose.to_array());
    sink.record_scalar("Drive/TravelDirection", ds.drive_ctrl_input.travel_direction_rad);
    sink.record_scalar("Drive/HeadingRate", ds.heading_rate_rads);
    sink.record_scalar("Drive/InertialVelocity", {
        let v = ds.drive_ctrl_input.imu.velocity_ms;
        v[0].hypot(v[1])
    });

    sink.record_scalar("Drive/VisionApplied", ds.loc_status_rpt.vision_applied as f64);
    sink.record_scalar("Drive/VisionDropped", ds.loc_status_rpt.vision_dropped as f64);

    let rpt = &ds.drive_ctrl_status_rpt;
    sink.record_scalar("Drive/Mode", rpt.mode as u8 as f64);
    if let Some(e) = rpt.aim_error_rad {
        sink.record_scalar("Drive/AimError", e);
    }
    sink.record_flag("Drive/IsAimed", rpt.is_aimed);
    sink.record_flag("Drive/Desaturated", rpt.desaturated);
    sink.record("Drive/ModuleTurnRates", &rpt.module_turn_rates_rads);

    for dem in ds.drive_ctrl_output.iter() {
        if let DriveDem::Set { setpoints, .. } = dem {
            let flat: Vec<f64> = setpoints
                .iter()
                .flat_map(|s| [s.speed_ms, s.angle_rad])
                .collect();
            sink.record("Drive/DesiredSwerveState", &flat);
        }
    }

    let measured: Vec<f64> = ds
        .drivetrain_data
        .module_states
        .iter()
        .flat_map(|s| [s.speed_ms, s.angle_rad])
        .collect();
    sink.record("Drive/ActualSwerveState", &measured);
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs::{self, File};

    #[derive(Default)]
    struct KeyRecorder {
        keys: Vec<String>,
    }

    impl TelemetrySink for KeyRecorder {
        fn record(&mut self, key: &str, _values: &[f64]) {
            self.keys.push(key.to_string());
        }
    }

    #[test]
    fn test_archive_rows() {
        let path = std::env::temp_dir().join(format!("swerve_tm_{}.csv", std::process::id()));
        let mut tm = ArchiveTelemetry::from_archiver(Archiver::from_writer(
            File::create(&path).unwrap(),
        ));

        tm.set_time_s(1.5);
        tm.record("Drive/Pose", &[1.0, 2.0, 0.5]);
        tm.record_flag("Drive/IsAimed", true);

        let contents = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).ok();

        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["1.500,Drive/Pose,1,2,0.5", "1.500,Drive/IsAimed,1"]);
    }

    #[test]
    fn test_record_cycle() {
        let mut rec = KeyRecorder::default();
        let ds = DataStore::default();

        record_cycle(&mut rec, &ds);

        assert!(rec.keys.iter().any(|k| k == "Drive/Pose"));

        // No aim error outside of aiming
        assert!(!rec.keys.iter().any(|k| k == "Drive/AimError"));
    }
}
