//! Host platform (linux for example) utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the software root, which
/// contains the `params` and `sessions` directories.
pub const SW_ROOT_ENV_VAR: &str = "SWERVE_SW_ROOT";

/// Retrieve uname information.
pub fn get_uname() -> std::io::Result<uname::Info> {
    uname::uname()
}

/// Get the software root directory from the environment.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
