//! Simulated equipment drivers

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use noise::{NoiseFn, Perlin, Seedable};

// Internal
use super::SharedWorld;
use comms_if::eqpt::{
    imu::{Imu, ImuData},
    module::{ModulePosition, ModuleSetpoint, ModuleState, SwerveModule, TractionInput},
    vision::{VisionEstimate, VisionSource},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Rate at which the vision error wanders.
///
/// Units: 1/seconds
const VISION_NOISE_FREQ_HZ: f64 = 0.73;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An ideal module which reaches its setpoint instantly.
pub struct SimModule {
    world: SharedWorld,
    index: usize,
}

pub struct SimImu {
    world: SharedWorld,
}

/// Vision source reporting the true pose with a smoothly varying error.
pub struct SimVision {
    world: SharedWorld,

    /// Units: seconds
    period_s: f64,

    /// Units: meters, meters, radians
    std_dev: [f64; 3],

    /// Units: seconds
    last_estimate_s: Option<f64>,

    noise: Perlin,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimModule {
    /// Create drivers for every module in the world, in module order.
    pub fn all(world: &SharedWorld) -> Vec<Box<dyn SwerveModule>> {
        let n = world.borrow().num_modules();
        (0..n)
            .map(|index| {
                Box::new(SimModule {
                    world: world.clone(),
                    index,
                }) as Box<dyn SwerveModule>
            })
            .collect()
    }
}

impl SwerveModule for SimModule {
    fn state(&self) -> ModuleState {
        self.world.borrow().module(self.index).state
    }

    fn position(&self) -> ModulePosition {
        self.world.borrow().module_position(self.index)
    }

    fn set(&mut self, setpoint: ModuleSetpoint, _traction: Option<TractionInput>) {
        self.world.borrow_mut().set_module(self.index, setpoint);
    }

    fn lock(&mut self) {
        self.world.borrow_mut().lock_module(self.index);
    }

    fn stop(&mut self) {
        self.world.borrow_mut().stop_module(self.index);
    }

    fn enable_traction_control(&mut self) {
        self.world.borrow_mut().set_module_traction(self.index, true);
    }

    fn disable_traction_control(&mut self) {
        self.world
            .borrow_mut()
            .set_module_traction(self.index, false);
    }
}

impl SimImu {
    pub fn new(world: &SharedWorld) -> Self {
        Self {
            world: world.clone(),
        }
    }
}

impl Imu for SimImu {
    fn sample(&self) -> ImuData {
        self.world.borrow().imu()
    }
}

impl SimVision {
    /// Produce an estimate every `period_s` with an error of up to `std_dev` on each axis.
    pub fn new(world: &SharedWorld, period_s: f64, std_dev: [f64; 3], seed: u32) -> Self {
        Self {
            world: world.clone(),
            period_s,
            std_dev,
            last_estimate_s: None,
            noise: Perlin::new().set_seed(seed),
        }
    }
}

impl VisionSource for SimVision {
    fn estimated_poses(&mut self) -> Vec<VisionEstimate> {
        let world = self.world.borrow();
        let time_s = world.time_s();

        if let Some(last_s) = self.last_estimate_s {
            if time_s - last_s < self.period_s {
                return Vec::new();
            }
        }
        self.last_estimate_s = Some(time_s);

        // One noise channel per axis, offset so that they are uncorrelated
        let t = time_s * VISION_NOISE_FREQ_HZ;
        let err: Vec<f64> = (0..3)
            .map(|axis| {
                let n = self.noise.get([t, 10.5 * axis as f64 + 0.5]);
                n.clamp(-1.0, 1.0) * self.std_dev[axis]
            })
            .collect();

        let pose = world.pose();

        vec![VisionEstimate {
            position_m: [pose.x_m() + err[0], pose.y_m() + err[1]],
            heading_rad: pose.heading_rad + err[2],
            timestamp_s: time_s,
            std_dev: self.std_dev,
        }]
    }
}

#[cfg(test)]
mod test {
    use super::super::{test_geometry, SimWorld};
    use super::*;
    use crate::geom::Pose;

    #[test]
    fn test_vision_period() {
        let world = SimWorld::new(test_geometry(), Pose::new(2.0, 3.0, 0.1))
            .unwrap()
            .into_shared();
        let mut vision = SimVision::new(&world, 0.1, [0.05, 0.05, 0.02], 7);

        let first = vision.estimated_poses();
        assert_eq!(first.len(), 1);
        assert!(first[0].is_valid());
        assert!((first[0].position_m[0] - 2.0).abs() <= 0.05 + 1e-9);
        assert!((first[0].heading_rad - 0.1).abs() <= 0.02 + 1e-9);

        world.borrow_mut().step(0.05).unwrap();
        assert!(vision.estimated_poses().is_empty());

        world.borrow_mut().step(0.05).unwrap();
        assert_eq!(vision.estimated_poses().len(), 1);
    }

    #[test]
    fn test_modules_share_world() {
        let world = SimWorld::new(test_geometry(), Pose::default())
            .unwrap()
            .into_shared();
        let mut modules = SimModule::all(&world);

        assert_eq!(modules.len(), 4);

        modules[2].set(
            ModuleSetpoint {
                speed_ms: 1.5,
                angle_rad: 0.3,
            },
            None,
        );
        assert_eq!(world.borrow().module(2).state.speed_ms, 1.5);

        modules[2].disable_traction_control();
        assert!(!world.borrow().module(2).traction_enabled);

        modules[2].stop();
        assert_eq!(modules[2].state().speed_ms, 0.0);
        assert_eq!(modules[2].state().angle_rad, 0.3);
    }
}
