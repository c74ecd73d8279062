//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable (SWERVE_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot load the parameter file {0:?}: {1}")]
    FileLoadError(PathBuf, std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// The file path is relative to the "<SWERVE_SW_ROOT>/params" directory
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    // Get the params dir
    let mut path = crate::host::get_sw_root().map_err(|_| LoadError::SwRootNotSet)?;
    path.push("params");
    path.push(param_file_path);

    // Load the file into a string
    let params_str = match read_to_string(&path) {
        Ok(s) => s,
        Err(e) => return Err(LoadError::FileLoadError(path, e)),
    };

    from_str(params_str.as_str())
}

/// Parse parameters from an in-memory TOML string.
pub fn from_str<P>(params_str: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    toml::from_str(params_str).map_err(LoadError::DeserialiseError)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct TestParams {
        period_s: f64,
        gains: [f64; 3],
        gate_m: Option<f64>,
    }

    #[test]
    fn test_from_str() {
        let p: TestParams = from_str("period_s = 0.02\ngains = [1.0, 0.0, 0.5]\n").unwrap();

        assert_eq!(p.period_s, 0.02);
        assert_eq!(p.gains, [1.0, 0.0, 0.5]);
        assert!(p.gate_m.is_none());
    }

    #[test]
    fn test_from_str_invalid() {
        let res: Result<TestParams, _> = from_str("period_s = \"fast\"");
        assert!(matches!(res, Err(LoadError::DeserialiseError(_))));
    }
}
