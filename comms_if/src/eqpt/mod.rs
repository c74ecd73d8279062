//! # Equipment Interface
//!
//! This module defines the interface structures and traits for the drive equipment. The control
//! core only ever talks to equipment through these traits, so real drivers and simulated ones can
//! be swapped freely.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod imu;
pub mod module;
pub mod vision;
