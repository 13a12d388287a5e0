//! Current-command output vectors for the driver seam.
//!
//! `repr(C)` with compile-time size asserts: the power-stage side reads
//! these as raw binary, so the layout is part of the contract.

use static_assertions::const_assert_eq;

/// Two-actuator current command produced by the coupled/xy modes —
/// 2 × f64 = 16 bytes.
///
/// One entry per physical actuator; no clamping is applied at this layer
/// (the driver is the last line of defense).
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct CoupledCommand {
    /// Current command for the theta actuator [A].
    pub current_theta: f64,
    /// Current command for the gamma actuator [A].
    pub current_gamma: f64,
}

const_assert_eq!(core::mem::size_of::<CoupledCommand>(), 16);

impl Default for CoupledCommand {
    fn default() -> Self {
        Self {
            current_theta: 0.0,
            current_gamma: 0.0,
        }
    }
}

impl CoupledCommand {
    /// Returns true if both commands are finite (not NaN, not Inf).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.current_theta.is_finite() && self.current_gamma.is_finite()
    }
}
