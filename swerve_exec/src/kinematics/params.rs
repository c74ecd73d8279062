//! Parameters structure for the kinematics

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the kinematics.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    // ---- GEOMETRY ----
    /// The position of each module's wheel contact point relative to the robot's rotation centre,
    /// in module order.
    ///
    /// Units: meters,
    /// Frame: Robot body
    pub module_positions_m_rb: Vec<[f64; 2]>,

    // ---- TIMING ----
    /// Period of the control loop that demands are held for.
    ///
    /// Units: seconds
    pub loop_period_s: f64,

    // ---- CAPABILITIES ----
    /// Maximum ground speed of any module.
    ///
    /// Units: meters/second
    pub max_module_speed_ms: f64,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_param_file_loads() {
        let params: Params =
            util::params::from_str(include_str!("../../../params/kinematics.toml")).unwrap();

        assert_eq!(params.module_positions_m_rb.len(), 4);
        assert!(params.loop_period_s > 0.0);
    }
}
