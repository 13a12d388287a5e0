//! System-wide constants for the helix workspace.
//!
//! Single source of truth for encoder geometry, tick timing and the
//! default controller gains. Default gains that derive from physical
//! constants are spelled out as named expressions, never inlined at the
//! point of use.

use std::f64::consts::PI;

/// Encoder counts per electrical revolution (600 PPR quadrature).
pub const ENCODER_CPR: f64 = 2400.0;

/// Number of samples in the anticogging map — one mechanical revolution
/// divided into this many calibration positions.
pub const COGGING_MAP_SIZE: usize = 3600;

/// Control tick rate [Hz].
pub const CONTROL_TICK_HZ: f64 = 8000.0;

/// Control tick period [s].
pub const CONTROL_TICK_PERIOD: f64 = 1.0 / CONTROL_TICK_HZ;

// ─── Scalar-loop default gains ──────────────────────────────────────

/// Default position gain [(counts/s) / counts].
pub const DEFAULT_POS_GAIN: f64 = 0.01;

/// Default velocity gain [A/(counts/s)].
pub const DEFAULT_VEL_GAIN: f64 = 5.0 / 10_000.0;

/// Default velocity integrator gain [A/((counts/s)·s)].
pub const DEFAULT_VEL_INTEGRATOR_GAIN: f64 = 10.0 / 10_000.0;

/// Default velocity limit [counts/s].
pub const DEFAULT_VEL_LIMIT: f64 = 20_000.0;

// ─── Coupled-joint default gains ────────────────────────────────────
//
// The joint gains are the scalar count-domain gains rescaled into the
// radian domain (6000 counts per mechanical revolution span / 2π rad).

/// Default proportional gain on the theta joint [N·m/rad].
pub const DEFAULT_KP_THETA: f64 = 0.04 * 6000.0 / (2.0 * PI);

/// Default derivative gain on the theta joint [N·m/(rad/s)].
pub const DEFAULT_KD_THETA: f64 = 5.0 / 10_000.0 * 6000.0 / (2.0 * PI);

/// Default proportional gain on the gamma joint [N·m/rad].
pub const DEFAULT_KP_GAMMA: f64 = 0.01 * 6000.0 / (2.0 * PI);

/// Default derivative gain on the gamma joint [N·m/(rad/s)].
pub const DEFAULT_KD_GAMMA: f64 = 5.0 / 10_000.0 * 6000.0 / (2.0 * PI);

// ─── Actuator / linkage defaults ────────────────────────────────────

/// Default gear ratio between motor and joint.
pub const DEFAULT_GEAR_RATIO: f64 = 4.0;

/// Default actuator torque constant [N·m/A].
pub const DEFAULT_TORQUE_CONSTANT: f64 = 0.0285;

/// Default proximal link length [m].
pub const DEFAULT_LINK_A: f64 = 0.09;

/// Default distal link length [m].
pub const DEFAULT_LINK_B: f64 = 0.162;

// ─── Anticogging calibration defaults ───────────────────────────────

/// Default settling window on position error [counts].
pub const DEFAULT_CALIB_POS_THRESHOLD: f64 = 1.0;

/// Default settling window on velocity [counts/s].
pub const DEFAULT_CALIB_VEL_THRESHOLD: f64 = 1.0;
