//! Module geometry

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;

use super::KinematicsError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Position of every module's contact point relative to the robot's rotation centre.
///
/// Modules are held in the fixed module order used everywhere else in the drive. The geometry
/// cannot be changed once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleGeometry {
    positions_m: Vec<Vector2<f64>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ModuleGeometry {
    /// Build the geometry, failing if there are fewer than two modules or any position is not
    /// finite.
    pub fn new(positions_m: Vec<Vector2<f64>>) -> Result<Self, KinematicsError> {
        if positions_m.len() < 2 {
            return Err(KinematicsError::TooFewModules(positions_m.len()));
        }

        if let Some(i) = positions_m
            .iter()
            .position(|p| !(p[0].is_finite() && p[1].is_finite()))
        {
            return Err(KinematicsError::NonFiniteModulePosition(i));
        }

        Ok(Self { positions_m })
    }

    /// Build the geometry from `[x, y]` arrays, as found in parameter files.
    pub fn from_arrays(positions_m: &[[f64; 2]]) -> Result<Self, KinematicsError> {
        Self::new(
            positions_m
                .iter()
                .map(|p| Vector2::new(p[0], p[1]))
                .collect(),
        )
    }

    pub fn num_modules(&self) -> usize {
        self.positions_m.len()
    }

    pub fn positions_m(&self) -> &[Vector2<f64>] {
        &self.positions_m
    }

    /// Verify that a set of per-module data matches the number of modules.
    pub(crate) fn check_count(&self, found: usize) -> Result<(), KinematicsError> {
        if found != self.num_modules() {
            Err(KinematicsError::ModuleCountMismatch {
                expected: self.num_modules(),
                found,
            })
        }
        else {
            Ok(())
        }
    }
}
