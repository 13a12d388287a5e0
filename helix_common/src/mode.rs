//! Control-mode enumeration.
//!
//! Modes are sorted from lowest level of control to highest level of
//! control, so ordered comparisons like `mode >= ControlMode::Velocity`
//! are meaningful: every mode at or above a given level runs that level's
//! law as part of its cascade.

use serde::{Deserialize, Serialize};

/// Active control law selector.
///
/// Exactly one mode is active at a time. The numeric ordering is part of
/// the contract — `Voltage` is the lowest abstraction level, `Xy` the
/// highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    /// Raw voltage command — no current law runs at this layer.
    Voltage = 0,
    /// Current passthrough (identity law).
    Current = 1,
    /// Velocity PI loop.
    Velocity = 2,
    /// Position P loop cascaded onto the velocity loop.
    Position = 3,
    /// Independent PD per joint in (theta, gamma) space.
    Coupled = 4,
    /// Cartesian PD with Jacobian-transposed force-to-torque transform.
    Xy = 5,
}

impl ControlMode {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Voltage),
            1 => Some(Self::Current),
            2 => Some(Self::Velocity),
            3 => Some(Self::Position),
            4 => Some(Self::Coupled),
            5 => Some(Self::Xy),
            _ => None,
        }
    }

    /// True for the two-actuator kinematic modes served by the coupled
    /// entry point rather than the scalar one.
    #[inline]
    pub const fn is_coupled(&self) -> bool {
        matches!(self, Self::Coupled | Self::Xy)
    }
}

impl Default for ControlMode {
    fn default() -> Self {
        Self::Position
    }
}
