//! # Vision Equipment Interface
//!
//! The vision pipeline produces field pose estimates from fiducial observations. Estimates arrive
//! asynchronously and late, so each one carries the time at which its image was captured.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single robot pose estimate produced by the vision pipeline.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq)]
pub struct VisionEstimate {
    /// Estimated robot position in the field frame, `[x, y]`.
    ///
    /// Units: meters
    pub position_m: [f64; 2],

    /// Estimated robot heading in the field frame.
    ///
    /// Units: radians
    pub heading_rad: f64,

    /// Capture time of the image the estimate was derived from, on the control loop's clock.
    ///
    /// Units: seconds
    pub timestamp_s: f64,

    /// Standard deviation of the estimate, `[x, y, heading]`.
    ///
    /// Units: meters, meters, radians
    pub std_dev: [f64; 3],
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of vision pose estimates.
pub trait VisionSource {
    /// Get all estimates produced since the last call. May be empty.
    fn estimated_poses(&mut self) -> Vec<VisionEstimate>;
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl VisionEstimate {
    /// Whether every field of the estimate holds usable data.
    ///
    /// Non-finite values or negative standard deviations mark an estimate as malformed.
    pub fn is_valid(&self) -> bool {
        self.position_m.iter().all(|v| v.is_finite())
            && self.heading_rad.is_finite()
            && self.timestamp_s.is_finite()
            && self.std_dev.iter().all(|s| s.is_finite() && *s >= 0.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_is_valid() {
        let est = VisionEstimate {
            position_m: [1.0, 2.0],
            heading_rad: 0.5,
            timestamp_s: 3.0,
            std_dev: [0.1, 0.1, 0.05],
        };
        assert!(est.is_valid());

        assert!(!VisionEstimate { heading_rad: f64::NAN, ..est }.is_valid());
        assert!(!VisionEstimate { std_dev: [0.1, -0.1, 0.05], ..est }.is_valid());
        assert!(!VisionEstimate { timestamp_s: f64::INFINITY, ..est }.is_valid());
    }
}
