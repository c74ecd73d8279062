//! # Pose estimator
//!
//! Fuses wheel odometry with latent vision estimates.
//!
//! Odometry poses are kept in a short history buffer. When a vision estimate arrives the estimate
//! at its capture time is reconstructed, nudged towards the vision pose by a gain derived from the
//! two uncertainties, and stored as a vision update alongside the odometry pose at that time. The
//! current estimate is then the latest vision update carried forward by the odometry travelled
//! since it was captured.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info, trace};

use super::{LocError, Odometry, Params, PoseBuffer};
use crate::{geom::Pose, kinematics::ForwardKinematics};
use comms_if::eqpt::{module::ModulePosition, vision::VisionEstimate};
use util::module::State;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Movement below this between two cycles does not update the travel direction.
///
/// Units: meters
const TRAVEL_EPS_M: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Odometry and vision pose estimator.
#[derive(Debug, Clone)]
pub struct PoseEstimator {
    params: Params,

    /// Odometry variance, `[x, y, heading]`.
    odometry_var: [f64; 3],

    odometry: Odometry,

    odometry_buffer: PoseBuffer,

    /// Vision updates in ascending capture time order.
    vision_updates: Vec<(f64, VisionUpdate)>,

    estimate: Pose,

    prev_pose: Pose,

    /// Units: radians
    travel_direction_rad: f64,

    /// Units: radians/second
    heading_rate_rads: f64,

    /// Most recent well formed vision pose and its capture time, used by `reset_to_vision`.
    last_vision: Option<(f64, Pose)>,

    /// Time of the last odometry step, kept across resets.
    ///
    /// Units: seconds
    last_odometry_s: Option<f64>,

    /// Last readings passed to the odometry, used when resetting.
    last_gyro_yaw_rad: f64,
    last_positions: Vec<ModulePosition>,
}

/// A blended vision measurement together with the odometry pose at the time it was captured.
#[derive(Debug, Copy, Clone)]
struct VisionUpdate {
    vision_pose: Pose,
    odometry_pose: Pose,
}

/// Input data to the estimator's cyclic processing.
#[derive(Debug, Clone, Default)]
pub struct LocInput {
    /// Units: seconds
    pub timestamp_s: f64,

    /// Continuous gyro yaw.
    ///
    /// Units: radians
    pub gyro_yaw_rad: f64,

    /// Units: radians/second
    pub yaw_rate_rads: f64,

    pub module_positions: Vec<ModulePosition>,

    /// Vision estimates received this cycle, possibly none.
    pub vision: Vec<VisionEstimate>,
}

/// Status of one cycle of estimation.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub vision_applied: usize,
    pub vision_dropped: usize,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What happened to a vision estimate passed to the estimator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VisionOutcome {
    Applied,
    Dropped(DropReason),
}

/// Why a vision estimate was not used.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Non-finite values or negative standard deviations.
    Invalid,

    /// No odometry has been recorded to compare against.
    NoOdometry,

    /// Captured before the start of the odometry history.
    TooOld,

    /// Further from the current estimate than the configured gate.
    TooFar,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VisionUpdate {
    /// Carry the vision pose forward by the odometry travelled since it was captured.
    fn compensate(&self, pose: &Pose) -> Pose {
        self.vision_pose
            .transform_by(&pose.relative_to(&self.odometry_pose))
    }
}

impl PoseEstimator {
    pub fn new(
        params: Params,
        kinematics: ForwardKinematics,
        gyro_yaw_rad: f64,
        positions: &[ModulePosition],
        initial_pose: Pose,
    ) -> Result<Self, LocError> {
        if params
            .odometry_std_dev
            .iter()
            .any(|s| !s.is_finite() || *s < 0.0)
        {
            return Err(LocError::InvalidOdometryStdDev(params.odometry_std_dev));
        }

        if !params.history_window_s.is_finite() || params.history_window_s <= 0.0 {
            return Err(LocError::InvalidHistoryWindow(params.history_window_s));
        }

        let odometry = Odometry::new(kinematics, gyro_yaw_rad, positions, initial_pose)?;

        let s = params.odometry_std_dev;

        Ok(Self {
            odometry_var: [s[0] * s[0], s[1] * s[1], s[2] * s[2]],
            odometry,
            odometry_buffer: PoseBuffer::new(params.history_window_s),
            vision_updates: Vec::new(),
            estimate: initial_pose,
            prev_pose: initial_pose,
            travel_direction_rad: initial_pose.heading_rad,
            heading_rate_rads: 0.0,
            last_vision: None,
            last_odometry_s: None,
            last_gyro_yaw_rad: gyro_yaw_rad,
            last_positions: positions.to_vec(),
            params,
        })
    }

    /// Apply one odometry step, returning the new estimate.
    pub fn update_odometry(
        &mut self,
        timestamp_s: f64,
        gyro_yaw_rad: f64,
        yaw_rate_rads: f64,
        positions: &[ModulePosition],
    ) -> Result<Pose, LocError> {
        let odometry_pose = self.odometry.update(gyro_yaw_rad, positions)?;

        self.last_odometry_s = Some(timestamp_s);
        self.last_gyro_yaw_rad = gyro_yaw_rad;
        self.last_positions.clear();
        self.last_positions.extend_from_slice(positions);

        self.odometry_buffer.add_sample(timestamp_s, odometry_pose);

        self.prev_pose = self.estimate;
        self.estimate = match self.vision_updates.last() {
            Some((_, update)) => update.compensate(&odometry_pose),
            None => odometry_pose,
        };

        let travelled = self.estimate.position_m - self.prev_pose.position_m;
        if travelled.norm() > TRAVEL_EPS_M {
            self.travel_direction_rad = travelled[1].atan2(travelled[0]);
        }

        self.heading_rate_rads = yaw_rate_rads;

        Ok(self.estimate)
    }

    /// Blend a vision estimate into the pose estimate.
    pub fn add_vision_measurement(&mut self, measurement: &VisionEstimate) -> VisionOutcome {
        if !measurement.is_valid() {
            debug!("Dropping malformed vision estimate: {:?}", measurement);
            return VisionOutcome::Dropped(DropReason::Invalid);
        }

        let measured_pose = Pose::new(
            measurement.position_m[0],
            measurement.position_m[1],
            measurement.heading_rad,
        );
        self.last_vision = Some((measurement.timestamp_s, measured_pose));

        let last_odometry_s = match self.odometry_buffer.last_time_s() {
            Some(t) => t,
            None => {
                debug!("Dropping vision estimate, no odometry recorded yet");
                return VisionOutcome::Dropped(DropReason::NoOdometry);
            }
        };

        if measurement.timestamp_s < last_odometry_s - self.odometry_buffer.history_s() {
            debug!(
                "Dropping vision estimate captured at {:.3} s, odometry history starts at {:.3} s",
                measurement.timestamp_s,
                last_odometry_s - self.odometry_buffer.history_s()
            );
            return VisionOutcome::Dropped(DropReason::TooOld);
        }

        if let Some(max_jump_m) = self.params.vision_max_jump_m {
            let jump_m = self.estimate.distance_to(&measured_pose);
            if jump_m > max_jump_m {
                debug!(
                    "Dropping vision estimate {:.3} m from the current estimate",
                    jump_m
                );
                return VisionOutcome::Dropped(DropReason::TooFar);
            }
        }

        self.cleanup_vision_updates();

        let odometry_sample = self.odometry_buffer.sample(measurement.timestamp_s);
        let estimate_sample = self.sample_at(measurement.timestamp_s);
        let (odometry_sample, estimate_sample) = match (odometry_sample, estimate_sample) {
            (Some(o), Some(e)) => (o, e),
            _ => return VisionOutcome::Dropped(DropReason::NoOdometry),
        };

        let mut gain = [0.0; 3];
        for i in 0..3 {
            let q = self.odometry_var[i];
            let r = measurement.std_dev[i] * measurement.std_dev[i];
            gain[i] = if q == 0.0 {
                0.0
            }
            else {
                q / (q + (q * r).sqrt())
            };
        }

        let correction = estimate_sample
            .log(&measured_pose)
            .scaled_elementwise(&gain);

        let update = VisionUpdate {
            vision_pose: estimate_sample.exp(&correction),
            odometry_pose: odometry_sample,
        };

        // Updates captured at or after this one were built on the old estimate
        self.vision_updates
            .retain(|(t, _)| *t < measurement.timestamp_s);
        self.vision_updates.push((measurement.timestamp_s, update));

        self.estimate = update.compensate(&self.odometry.pose());

        trace!(
            "Vision estimate at {:.3} s applied, estimate now {:?}",
            measurement.timestamp_s,
            self.estimate.to_array()
        );

        VisionOutcome::Applied
    }

    /// The estimate as it stood at the given time, if any odometry has been recorded.
    pub fn sample_at(&self, time_s: f64) -> Option<Pose> {
        let first_update_s = match self.vision_updates.first() {
            Some((t, _)) if time_s >= *t => *t,
            _ => return self.odometry_buffer.sample(time_s),
        };

        let oldest_s = self.odometry_buffer.first_time_s()?;
        let newest_s = self.odometry_buffer.last_time_s()?;
        let time_s = time_s.max(oldest_s).min(newest_s).max(first_update_s);

        let floor = self
            .vision_updates
            .iter()
            .rev()
            .find(|(t, _)| *t <= time_s)
            .map(|(_, u)| *u)?;

        let odometry_pose = self.odometry_buffer.sample(time_s)?;

        Some(floor.compensate(&odometry_pose))
    }

    /// Reset the estimate to the given pose, keeping odometry continuous from here.
    pub fn reset_pose(&mut self, pose: Pose) -> Result<(), LocError> {
        self.odometry
            .reset(self.last_gyro_yaw_rad, &self.last_positions, pose)?;

        self.odometry_buffer.clear();
        self.vision_updates.clear();
        self.estimate = pose;
        self.prev_pose = pose;

        info!("Pose estimate reset to {:?}", pose.to_array());

        Ok(())
    }

    /// Reset the estimate to the most recent vision pose.
    ///
    /// Returns `false` if no vision pose has been received, or if the latest one was captured
    /// before the start of the odometry history.
    pub fn reset_to_vision(&mut self) -> Result<bool, LocError> {
        let (timestamp_s, pose) = match self.last_vision {
            Some(v) => v,
            None => {
                info!("No vision estimate to reset to");
                return Ok(false);
            }
        };

        if let Some(last_odometry_s) = self.last_odometry_s {
            if timestamp_s < last_odometry_s - self.odometry_buffer.history_s() {
                info!(
                    "Latest vision estimate is {:.3} s old, not resetting to it",
                    last_odometry_s - timestamp_s
                );
                return Ok(false);
            }
        }

        self.reset_pose(pose)?;
        Ok(true)
    }

    pub fn estimate(&self) -> Pose {
        self.estimate
    }

    /// The estimate before the most recent odometry step.
    pub fn prev_pose(&self) -> Pose {
        self.prev_pose
    }

    /// Direction of the last motion over the field, held while stationary.
    ///
    /// Units: radians
    pub fn travel_direction_rad(&self) -> f64 {
        self.travel_direction_rad
    }

    /// Units: radians/second
    pub fn heading_rate_rads(&self) -> f64 {
        self.heading_rate_rads
    }

    pub fn odometry_pose(&self) -> Pose {
        self.odometry.pose()
    }

    /// Drop vision updates no longer needed to reconstruct the history.
    fn cleanup_vision_updates(&mut self) {
        let oldest_s = match self.odometry_buffer.first_time_s() {
            Some(t) => t,
            None => return,
        };

        // Keep the newest update at or before the oldest odometry sample
        let keep_from = self
            .vision_updates
            .iter()
            .rposition(|(t, _)| *t <= oldest_s);

        if let Some(idx) = keep_from {
            self.vision_updates.drain(..idx);
        }
    }
}

impl State for PoseEstimator {
    type InputData = LocInput;
    type OutputData = Pose;
    type StatusReport = StatusReport;
    type ProcError = LocError;

    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let mut report = StatusReport::default();

        self.update_odometry(
            input_data.timestamp_s,
            input_data.gyro_yaw_rad,
            input_data.yaw_rate_rads,
            &input_data.module_positions,
        )?;

        for measurement in input_data.vision.iter() {
            match self.add_vision_measurement(measurement) {
                VisionOutcome::Applied => report.vision_applied += 1,
                VisionOutcome::Dropped(_) => report.vision_dropped += 1,
            }
        }

        Ok((self.estimate, report))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kinematics::ModuleGeometry;
    use approx::assert_abs_diff_eq;

    const DT: f64 = 0.02;

    fn positions(distance_m: f64) -> Vec<ModulePosition> {
        vec![
            ModulePosition {
                distance_m,
                angle_rad: 0.0
            };
            4
        ]
    }

    fn estimator(params: Params) -> PoseEstimator {
        let fk = ForwardKinematics::new(
            ModuleGeometry::from_arrays(&[[0.3, 0.3], [0.3, -0.3], [-0.3, 0.3], [-0.3, -0.3]])
                .unwrap(),
        )
        .unwrap();

        PoseEstimator::new(params, fk, 0.0, &positions(0.0), Pose::default()).unwrap()
    }

    fn vision(x_m: f64, y_m: f64, timestamp_s: f64, std_dev: f64) -> VisionEstimate {
        VisionEstimate {
            position_m: [x_m, y_m],
            heading_rad: 0.0,
            timestamp_s,
            std_dev: [std_dev; 3],
        }
    }

    /// Drive forwards at 1 m/s from t = 0 to t = `end_s`.
    fn drive(est: &mut PoseEstimator, end_s: f64) {
        let steps = (end_s / DT).round() as usize;
        for i in 0..=steps {
            let t = i as f64 * DT;
            est.update_odometry(t, 0.0, 0.0, &positions(t)).unwrap();
        }
    }

    #[test]
    fn test_stationary_pose_unchanged() {
        let mut est = estimator(Params::default());

        for i in 0..100 {
            est.update_odometry(i as f64 * DT, 0.0, 0.0, &positions(0.0))
                .unwrap();
        }

        assert_eq!(est.estimate(), Pose::default());
        assert_eq!(est.travel_direction_rad(), 0.0);
    }

    #[test]
    fn test_confident_vision_converges() {
        let mut est = estimator(Params::default());
        est.update_odometry(0.0, 0.0, 0.0, &positions(0.0)).unwrap();

        let outcome = est.add_vision_measurement(&vision(1.0, 0.0, 0.0, 1e-6));

        assert_eq!(outcome, VisionOutcome::Applied);
        assert_abs_diff_eq!(est.estimate().x_m(), 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(est.estimate().y_m(), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_equal_uncertainty_blends_halfway() {
        let mut est = estimator(Params::default());
        est.update_odometry(0.0, 0.0, 0.0, &positions(0.0)).unwrap();

        est.add_vision_measurement(&vision(0.0, 0.2, 0.0, 0.03));

        // q = r so the gain is a half
        assert_abs_diff_eq!(est.estimate().y_m(), 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_past_vision_carried_forward() {
        let mut est = estimator(Params::default());
        drive(&mut est, 1.0);

        let outcome = est.add_vision_measurement(&vision(0.5, 0.5, 0.5, 1e-9));

        assert_eq!(outcome, VisionOutcome::Applied);
        assert_abs_diff_eq!(est.estimate().x_m(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(est.estimate().y_m(), 0.5, epsilon = 1e-6);

        // Odometry keeps running from the corrected estimate
        est.update_odometry(1.02, 0.0, 0.0, &positions(1.02)).unwrap();
        assert_abs_diff_eq!(est.estimate().x_m(), 1.02, epsilon = 1e-6);
        assert_abs_diff_eq!(est.estimate().y_m(), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(est.travel_direction_rad(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_dropped_vision() {
        let mut est = estimator(Params {
            vision_max_jump_m: Some(1.0),
            ..Params::default()
        });

        assert_eq!(
            est.add_vision_measurement(&vision(0.0, 0.0, 0.0, 0.1)),
            VisionOutcome::Dropped(DropReason::NoOdometry)
        );

        drive(&mut est, 2.0);
        let before = est.estimate();

        assert_eq!(
            est.add_vision_measurement(&vision(0.1, 0.0, 0.1, 0.1)),
            VisionOutcome::Dropped(DropReason::TooOld)
        );
        assert_eq!(
            est.add_vision_measurement(&vision(f64::NAN, 0.0, 1.9, 0.1)),
            VisionOutcome::Dropped(DropReason::Invalid)
        );
        assert_eq!(
            est.add_vision_measurement(&vision(2.0, 5.0, 1.9, 0.1)),
            VisionOutcome::Dropped(DropReason::TooFar)
        );

        assert_eq!(est.estimate(), before);
    }

    #[test]
    fn test_reset_keeps_odometry_continuous() {
        let mut est = estimator(Params::default());
        drive(&mut est, 0.5);

        est.reset_pose(Pose::new(2.0, 3.0, std::f64::consts::FRAC_PI_2))
            .unwrap();
        est.update_odometry(0.52, 0.0, 0.0, &positions(0.52)).unwrap();

        // Moved 0.02 m along the new heading
        assert_abs_diff_eq!(est.estimate().x_m(), 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(est.estimate().y_m(), 3.02, epsilon = 1e-9);
    }

    #[test]
    fn test_reset_to_vision() {
        let mut est = estimator(Params::default());
        assert!(!est.reset_to_vision().unwrap());

        est.update_odometry(0.0, 0.0, 0.0, &positions(0.0)).unwrap();
        est.add_vision_measurement(&vision(4.0, -1.0, 0.0, 10.0));
        assert!(est.reset_to_vision().unwrap());

        assert_abs_diff_eq!(est.estimate().x_m(), 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(est.estimate().y_m(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reset_to_stale_vision_refused() {
        let mut est = estimator(Params::default());
        est.update_odometry(0.0, 0.0, 0.0, &positions(0.0)).unwrap();
        est.add_vision_measurement(&vision(0.0, 0.0, 0.0, 10.0));

        // Drive 5 m with no further vision, well past the history window
        drive(&mut est, 5.0);
        let before = est.estimate();
        assert_abs_diff_eq!(before.x_m(), 5.0, epsilon = 1e-6);

        assert!(!est.reset_to_vision().unwrap());
        assert_eq!(est.estimate(), before);

        // Still stale after a manual reset
        est.reset_pose(before).unwrap();
        assert!(!est.reset_to_vision().unwrap());

        // A fresh estimate is used again
        est.add_vision_measurement(&vision(4.8, 0.2, 4.9, 10.0));
        assert!(est.reset_to_vision().unwrap());
        assert_abs_diff_eq!(est.estimate().x_m(), 4.8, epsilon = 1e-12);
        assert_abs_diff_eq!(est.estimate().y_m(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_proc_counts_vision() {
        let mut est = estimator(Params::default());

        let (_, report) = est
            .proc(&LocInput {
                timestamp_s: 0.0,
                module_positions: positions(0.0),
                vision: vec![vision(0.1, 0.0, 0.0, 0.1), vision(0.0, 0.0, f64::NAN, 0.1)],
                ..LocInput::default()
            })
            .unwrap();

        assert_eq!(
            report,
            StatusReport {
                vision_applied: 1,
                vision_dropped: 1
            }
        );
    }
}
