//! # Alliance

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The alliance the robot is playing for.
///
/// The field frame is always the blue alliance's frame, with the origin in the blue alliance's
/// right hand corner.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Alliance {
    Blue,
    Red,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of the current alliance declaration.
pub trait AllianceSource {
    /// The declared alliance, or `None` if it is not yet known.
    fn alliance(&self) -> Option<Alliance>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

/// A fixed alliance declaration, useful when the alliance is configured rather than received.
impl AllianceSource for Option<Alliance> {
    fn alliance(&self) -> Option<Alliance> {
        *self
    }
}
