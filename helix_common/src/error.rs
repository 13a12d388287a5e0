//! Per-tick controller fault type.
//!
//! Nothing here is fatal to the process: every variant is a local signal
//! the owning axis must act on, typically by requesting a lower control
//! mode or stopping the axis.

use thiserror::Error;

use crate::mode::ControlMode;

/// Fault raised by a control-tick entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControlError {
    /// The active mode is not served by the entry point that was called
    /// (scalar `update` while a coupled mode is active, or vice versa).
    #[error("control mode {mode:?} is not served by this entry point")]
    ModeMismatch {
        /// Mode that was active when the wrong entry point ran.
        mode: ControlMode,
    },

    /// Anticogging calibration state is inconsistent for this tick
    /// (e.g. the calibrating flag is raised but no map is allocated).
    #[error("anticogging calibration state inconsistent: {reason}")]
    CalibrationState {
        /// What was found to be inconsistent.
        reason: &'static str,
    },
}
