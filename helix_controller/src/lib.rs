//! # Helix Controller Library
//!
//! Per-tick feedback controller for one motor axis. Converts a desired
//! mechanical setpoint (position, velocity, current, or a coupled two-joint
//! kinematic target) plus the latest sensed position/velocity into the
//! current command consumed by the power stage, once per control tick.
//!
//! ## Responsibilities
//!
//! 1. **Setpoint & gain store** — O(1) field writes from the command context
//! 2. **Cascaded control law** — position → velocity → current
//! 3. **Coupled kinematics** — joint/Cartesian PD with a live 2×2 Jacobian
//! 4. **Anticogging calibration** — position-indexed compensation sweep
//!
//! ## Real-Time Discipline
//!
//! The tick path performs no heap allocation, no blocking and no I/O. The
//! single exception is the one-time cogging-map allocation in
//! [`Controller::start_anticogging_calibration`], which must run outside
//! the tightest timing budget.

pub mod axis;
pub mod config;
pub mod control;
pub mod controller;
pub mod props;

pub use controller::{Controller, ControllerState, JointFeedback};
