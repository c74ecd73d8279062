//! # Drivetrain
//!
//! The drivetrain owns the module drivers and the IMU. It samples them once per cycle and applies
//! the demands produced by drive control, either to every module or to none.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::collections::VecDeque;

// Internal
use crate::drive_ctrl::DriveDem;
use comms_if::eqpt::{
    imu::{Imu, ImuData},
    module::{ModulePosition, ModuleState, SwerveModule},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The module drivers and IMU.
pub struct Drivetrain {
    modules: Vec<Box<dyn SwerveModule>>,

    imu: Box<dyn Imu>,

    /// Median filters for the IMU's `[x, y]` velocity.
    velocity_filters: [MedianFilter; 2],
}

/// One cycle's worth of sensing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DrivetrainData {
    /// IMU data with the velocity filtered.
    pub imu: ImuData,

    pub module_states: Vec<ModuleState>,

    pub module_positions: Vec<ModulePosition>,
}

/// Moving median over a fixed number of samples.
#[derive(Debug, Clone)]
pub struct MedianFilter {
    taps: usize,
    window: VecDeque<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DrivetrainError {
    #[error("A drivetrain needs at least one module")]
    NoModules,

    #[error("Median filter must have at least one tap")]
    InvalidFilterTaps,

    #[error("Demand has {found} module setpoints but the drivetrain has {expected} modules")]
    ModuleCountMismatch { expected: usize, found: usize },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Drivetrain {
    /// Create a drivetrain from its drivers, in module order.
    pub fn new(
        modules: Vec<Box<dyn SwerveModule>>,
        imu: Box<dyn Imu>,
        velocity_filter_taps: usize,
    ) -> Result<Self, DrivetrainError> {
        if modules.is_empty() {
            return Err(DrivetrainError::NoModules);
        }

        let filter = MedianFilter::new(velocity_filter_taps)?;

        Ok(Self {
            modules,
            imu,
            velocity_filters: [filter.clone(), filter],
        })
    }

    pub fn num_modules(&self) -> usize {
        self.modules.len()
    }

    /// Sample the IMU and every module.
    pub fn sense(&mut self) -> DrivetrainData {
        let mut imu = self.imu.sample();
        imu.velocity_ms = [
            self.velocity_filters[0].calculate(imu.velocity_ms[0]),
            self.velocity_filters[1].calculate(imu.velocity_ms[1]),
        ];

        DrivetrainData {
            imu,
            module_states: self.modules.iter().map(|m| m.state()).collect(),
            module_positions: self.modules.iter().map(|m| m.position()).collect(),
        }
    }

    /// Apply a cycle's demands in order.
    ///
    /// Every demand is checked before any is applied, so on error no module has been written.
    pub fn apply(&mut self, dems: &[DriveDem]) -> Result<(), DrivetrainError> {
        for dem in dems {
            if let DriveDem::Set {
                setpoints,
                traction,
            } = dem
            {
                self.check_count(setpoints.len())?;
                if let Some(t) = traction {
                    self.check_count(t.len())?;
                }
            }
        }

        for dem in dems {
            trace!("Applying {:?}", dem);

            match dem {
                DriveDem::Set {
                    setpoints,
                    traction,
                } => {
                    for (i, module) in self.modules.iter_mut().enumerate() {
                        let t = traction.as_ref().map(|t| t[i]);
                        module.set(setpoints[i], t);
                    }
                }
                DriveDem::Stop => self.modules.iter_mut().for_each(|m| m.stop()),
                DriveDem::Lock => self.modules.iter_mut().for_each(|m| m.lock()),
                DriveDem::EnableTractionControl => {
                    debug!("Enabling module traction control");
                    self.modules
                        .iter_mut()
                        .for_each(|m| m.enable_traction_control())
                }
                DriveDem::DisableTractionControl => {
                    debug!("Disabling module traction control");
                    self.modules
                        .iter_mut()
                        .for_each(|m| m.disable_traction_control())
                }
            }
        }

        Ok(())
    }

    fn check_count(&self, found: usize) -> Result<(), DrivetrainError> {
        if found != self.modules.len() {
            Err(DrivetrainError::ModuleCountMismatch {
                expected: self.modules.len(),
                found,
            })
        }
        else {
            Ok(())
        }
    }
}

impl MedianFilter {
    pub fn new(taps: usize) -> Result<Self, DrivetrainError> {
        if taps == 0 {
            return Err(DrivetrainError::InvalidFilterTaps);
        }

        Ok(Self {
            taps,
            window: VecDeque::with_capacity(taps),
        })
    }

    /// Add a sample and return the median of the window.
    ///
    /// Until the window fills the median is taken over the samples seen so far. With an even
    /// number of samples the mean of the middle two is returned.
    pub fn calculate(&mut self, sample: f64) -> f64 {
        if self.window.len() == self.taps {
            self.window.pop_front();
        }
        self.window.push_back(sample);

        let mut sorted: Vec<f64> = self.window.iter().copied().collect();
        sorted.sort_by_key(|v| OrderedFloat(*v));

        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            0.5 * (sorted[mid - 1] + sorted[mid])
        }
        else {
            sorted[mid]
        }
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::module::{ModuleSetpoint, TractionInput};
    use std::{cell::RefCell, rc::Rc};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Set(ModuleSetpoint, Option<TractionInput>),
        Stop,
        Lock,
        Traction(bool),
    }

    struct RecordingModule {
        calls: Rc<RefCell<Vec<Call>>>,
    }

    impl SwerveModule for RecordingModule {
        fn state(&self) -> ModuleState {
            ModuleState::default()
        }

        fn position(&self) -> ModulePosition {
            ModulePosition::default()
        }

        fn set(&mut self, setpoint: ModuleSetpoint, traction: Option<TractionInput>) {
            self.calls.borrow_mut().push(Call::Set(setpoint, traction));
        }

        fn lock(&mut self) {
            self.calls.borrow_mut().push(Call::Lock);
        }

        fn stop(&mut self) {
            self.calls.borrow_mut().push(Call::Stop);
        }

        fn enable_traction_control(&mut self) {
            self.calls.borrow_mut().push(Call::Traction(true));
        }

        fn disable_traction_control(&mut self) {
            self.calls.borrow_mut().push(Call::Traction(false));
        }
    }

    struct SpikyImu {
        samples: RefCell<VecDeque<f64>>,
    }

    impl Imu for SpikyImu {
        fn sample(&self) -> ImuData {
            ImuData {
                velocity_ms: [self.samples.borrow_mut().pop_front().unwrap_or(0.0), 0.0],
                ..Default::default()
            }
        }
    }

    fn drivetrain(calls: &Rc<RefCell<Vec<Call>>>) -> Drivetrain {
        let modules: Vec<Box<dyn SwerveModule>> = (0..4)
            .map(|_| {
                Box::new(RecordingModule {
                    calls: calls.clone(),
                }) as Box<dyn SwerveModule>
            })
            .collect();

        let imu = SpikyImu {
            samples: RefCell::new(vec![1.0, 1.0, 50.0, 1.0].into()),
        };

        Drivetrain::new(modules, Box::new(imu), 3).unwrap()
    }

    #[test]
    fn test_apply_in_order() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut dt = drivetrain(&calls);

        let setpoint = ModuleSetpoint {
            speed_ms: 1.0,
            angle_rad: 0.5,
        };
        dt.apply(&[
            DriveDem::Stop,
            DriveDem::Set {
                setpoints: vec![setpoint; 4],
                traction: None,
            },
            DriveDem::Lock,
        ])
        .unwrap();

        let calls = calls.borrow();
        assert_eq!(calls.len(), 12);
        assert!(calls[..4].iter().all(|c| *c == Call::Stop));
        assert!(calls[4..8].iter().all(|c| *c == Call::Set(setpoint, None)));
        assert!(calls[8..].iter().all(|c| *c == Call::Lock));
    }

    #[test]
    fn test_apply_all_or_nothing() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut dt = drivetrain(&calls);

        let res = dt.apply(&[
            DriveDem::Stop,
            DriveDem::Set {
                setpoints: vec![ModuleSetpoint::default(); 3],
                traction: None,
            },
        ]);

        assert_eq!(
            res,
            Err(DrivetrainError::ModuleCountMismatch {
                expected: 4,
                found: 3
            })
        );
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_velocity_spike_filtered() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut dt = drivetrain(&calls);

        let v: Vec<f64> = (0..4).map(|_| dt.sense().imu.velocity_ms[0]).collect();

        assert_eq!(v, vec![1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_median_filter() {
        assert_eq!(
            MedianFilter::new(0).unwrap_err(),
            DrivetrainError::InvalidFilterTaps
        );

        let mut f = MedianFilter::new(4).unwrap();
        assert_eq!(f.calculate(3.0), 3.0);
        assert_eq!(f.calculate(1.0), 2.0);
        assert_eq!(f.calculate(2.0), 2.0);
        assert_eq!(f.calculate(10.0), 2.5);

        // Oldest sample (3.0) drops out
        assert_eq!(f.calculate(0.0), 1.5);
    }
}
