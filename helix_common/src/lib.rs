//! Helix Common Library
//!
//! Shared types and constants for the helix motor-control workspace.
//! The controller crate and the (external) axis/communication layers all
//! speak in terms of these definitions — no duplication permitted.
//!
//! # Module Structure
//!
//! - [`consts`] - Encoder, tick-rate and default-gain constants
//! - [`mode`] - `ControlMode` ordered enumeration
//! - [`config`] - `ControlConfig` tuning record with TOML-friendly defaults
//! - [`command`] - Current-command output vectors for the driver seam
//! - [`error`] - Per-tick controller fault type

pub mod command;
pub mod config;
pub mod consts;
pub mod error;
pub mod mode;
