//! Back-link from the controller to its owning axis.
//!
//! The axis owns the controller; the controller only holds a non-owning
//! association, established during axis assembly, used to report
//! calibration completion and to read axis-level run state. It is never a
//! source of ownership or lifetime control.

/// Contract the owning axis exposes to its controller.
pub trait AxisLink: Send + Sync {
    /// Called once when an anticogging calibration sweep completes.
    fn on_calibration_complete(&self);

    /// True while the axis is in a state that permits closed-loop motion.
    fn is_running(&self) -> bool;
}
