//! Localisation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the pose estimator.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Standard deviation of the odometry, `[x, y, heading]`.
    ///
    /// Larger values trust vision more.
    ///
    /// Units: meters, meters, radians
    pub odometry_std_dev: [f64; 3],

    /// How far back odometry history is kept. Vision estimates older than this are dropped.
    ///
    /// Units: seconds
    pub history_window_s: f64,

    /// If set, vision estimates further than this from the current estimate are dropped.
    ///
    /// Units: meters
    pub vision_max_jump_m: Option<f64>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            odometry_std_dev: [0.03, 0.03, 1f64.to_radians()],
            history_window_s: 1.5,
            vision_max_jump_m: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_param_file_loads() {
        let params: Params =
            util::params::from_str(include_str!("../../../params/loc.toml")).unwrap();

        assert_eq!(params.history_window_s, 1.5);
        assert!(params.vision_max_jump_m.is_none());
    }
}
