//! # Drive script interpreter module
//!
//! This module provides an interpreter for drive scripts, allowing telecommands to be executed
//! at fixed times. A script is a sequence of `<time_s>: <tc json>;` entries, for example:
//!
//! ```text
//! 0.0: {"type": "Teleop"};
//! 0.5: {"type": "Operator", "payload": {"x": 0.5, "y": 0.0, "rotate": 0.0}};
//! ```
//!
//! Anything outside an entry (such as comments) is ignored.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use thiserror::Error;

// Internal
use comms_if::tc::{Tc, TcParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which is scripted to occur at a specific time.
#[derive(Debug)]
struct Command {
    /// The time the command is supposed to execute at
    exec_time_s: f64,

    /// The Telecommand to run
    tc: Tc,
}

/// A script interpreter.
///
/// After initialising with the script to run use `.get_pending_tcs` to acquire a list of
/// telecommands that need executing.
#[derive(Debug)]
pub struct ScriptInterpreter {
    cmds: VecDeque<Command>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error("Script contains an invalid timestamp: {0}. Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid TC at {0} s: {1}")]
    InvalidTc(f64, TcParseError),

    #[error("Script entry at {0} s is earlier than the entry before it")]
    OutOfOrder(f64),
}

#[derive(Debug)]
pub enum PendingTcs {
    None,
    Some(Vec<Tc>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {
    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        let path = script_path.as_ref();

        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path.display().to_string()));
        }

        let script = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => return Err(ScriptError::ScriptLoadError(e)),
        };

        Self::from_str(&script)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_str(script: &str) -> Result<Self, ScriptError> {
        let mut tc_queue: VecDeque<Command> = VecDeque::new();

        // Entries are `<time>: <json>;`, the JSON payloads never contain a `;`
        let re = match RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
        {
            Ok(r) => r,
            Err(e) => return Err(ScriptError::InvalidTimestamp(format!("{}", e))),
        };

        for cap in re.captures_iter(script) {
            let time_str = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
            let exec_time_s: f64 = match time_str.parse() {
                Ok(t) => t,
                Err(e) => return Err(ScriptError::InvalidTimestamp(format!("{}", e))),
            };

            let tc_str = cap.get(3).map(|m| m.as_str()).unwrap_or_default();
            let tc = match Tc::from_json(tc_str) {
                Ok(c) => c,
                Err(e) => return Err(ScriptError::InvalidTc(exec_time_s, e)),
            };

            if let Some(prev) = tc_queue.back() {
                if prev.exec_time_s > exec_time_s {
                    return Err(ScriptError::OutOfOrder(exec_time_s));
                }
            }

            tc_queue.push_back(Command { exec_time_s, tc });
        }

        if tc_queue.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        Ok(ScriptInterpreter { cmds: tc_queue })
    }

    /// Return the TCs which are due at `current_time_s`.
    ///
    /// TCs are returned in script order and each TC is only returned once.
    pub fn get_pending_tcs(&mut self, current_time_s: f64) -> PendingTcs {
        if self.cmds.is_empty() {
            return PendingTcs::EndOfScript;
        }

        let mut tc_vec: Vec<Tc> = vec![];

        while let Some(cmd) = self.cmds.front() {
            if cmd.exec_time_s > current_time_s {
                break;
            }
            if let Some(cmd) = self.cmds.pop_front() {
                tc_vec.push(cmd.tc);
            }
        }

        if tc_vec.is_empty() {
            PendingTcs::None
        }
        else {
            PendingTcs::Some(tc_vec)
        }
    }

    /// Get the number of TCs left in the script
    pub fn get_num_tcs(&self) -> usize {
        self.cmds.len()
    }

    /// Get the time of the last TC in the script
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SCRIPT: &str = r#"
        # Drive forward then snap
        0.0: {"type": "Teleop"};
        0.5: {"type": "Operator", "payload": {"x": 0.5, "y": 0.0, "rotate": 0.0}};
        2.0: {"type": "Snap"};
    "#;

    #[test]
    fn test_pending_tcs() {
        let mut si = ScriptInterpreter::from_str(SCRIPT).unwrap();

        assert_eq!(si.get_num_tcs(), 3);
        assert_eq!(si.get_duration(), 2.0);

        match si.get_pending_tcs(0.0) {
            PendingTcs::Some(tcs) => assert_eq!(tcs, vec![Tc::Teleop]),
            p => panic!("Expected one TC, got {:?}", p),
        }

        assert!(matches!(si.get_pending_tcs(0.4), PendingTcs::None));

        match si.get_pending_tcs(3.0) {
            PendingTcs::Some(tcs) => assert_eq!(tcs.len(), 2),
            p => panic!("Expected two TCs, got {:?}", p),
        }

        assert!(matches!(si.get_pending_tcs(4.0), PendingTcs::EndOfScript));
    }

    #[test]
    fn test_bad_scripts() {
        assert!(matches!(
            ScriptInterpreter::from_str("nothing here"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            ScriptInterpreter::from_str(r#"1.0: {"type": "Jump"};"#),
            Err(ScriptError::InvalidTc(_, _))
        ));
        assert!(matches!(
            ScriptInterpreter::from_str("1.0: {\"type\": \"Snap\"};\n0.5: {\"type\": \"Stop\"};"),
            Err(ScriptError::OutOfOrder(_))
        ));
    }
}
