//! # Forward kinematics
//!
//! Each module's velocity is `v_i = [1, 0, -y_i; 0, 1, x_i] * [vx, vy, omega]`. Stacking these
//! rows gives an overdetermined system which is solved in the least squares sense with the
//! pseudo-inverse, computed once when the geometry is fixed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{DMatrix, DVector};

use super::{ChassisMotion, KinematicsError, ModuleGeometry};
use crate::geom::Twist;
use comms_if::eqpt::module::{ModulePosition, ModuleState};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Singular values below this are treated as zero when building the pseudo-inverse.
const PINV_EPS: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Least squares forward kinematics for a fixed module geometry.
#[derive(Debug, Clone)]
pub struct ForwardKinematics {
    geometry: ModuleGeometry,

    /// `3 x 2N` matrix mapping stacked module velocities to chassis motion.
    forward_matrix: DMatrix<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ForwardKinematics {
    pub fn new(geometry: ModuleGeometry) -> Result<Self, KinematicsError> {
        let n = geometry.num_modules();

        let mut inverse_matrix = DMatrix::<f64>::zeros(2 * n, 3);
        for (i, pos) in geometry.positions_m().iter().enumerate() {
            inverse_matrix[(2 * i, 0)] = 1.0;
            inverse_matrix[(2 * i, 2)] = -pos[1];
            inverse_matrix[(2 * i + 1, 1)] = 1.0;
            inverse_matrix[(2 * i + 1, 2)] = pos[0];
        }

        let forward_matrix = inverse_matrix
            .pseudo_inverse(PINV_EPS)
            .map_err(KinematicsError::DegenerateGeometry)?;

        Ok(Self {
            geometry,
            forward_matrix,
        })
    }

    /// Robot relative chassis motion from measured module states.
    pub fn to_chassis_motion(
        &self,
        states: &[ModuleState],
    ) -> Result<ChassisMotion, KinematicsError> {
        let v = self.solve(states.iter().map(|s| (s.speed_ms, s.angle_rad)), states.len())?;

        Ok(ChassisMotion::new(v[0], v[1], v[2]))
    }

    /// Robot relative twist from the change in each module's distance over one step.
    ///
    /// `deltas` holds the distance each wheel travelled and the angle it is at now.
    pub fn to_twist(&self, deltas: &[ModulePosition]) -> Result<Twist, KinematicsError> {
        let v = self.solve(deltas.iter().map(|d| (d.distance_m, d.angle_rad)), deltas.len())?;

        Ok(Twist::new(v[0], v[1], v[2]))
    }

    fn solve<I>(&self, polar: I, count: usize) -> Result<DVector<f64>, KinematicsError>
    where
        I: Iterator<Item = (f64, f64)>,
    {
        self.geometry.check_count(count)?;

        let mut module_vec = DVector::<f64>::zeros(2 * count);
        for (i, (mag, angle)) in polar.enumerate() {
            module_vec[2 * i] = mag * angle.cos();
            module_vec[2 * i + 1] = mag * angle.sin();
        }

        Ok(&self.forward_matrix * module_vec)
    }
}
