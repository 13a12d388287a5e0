//! Coupled two-joint kinematics: encoder conversion, joint/Cartesian PD,
//! and the configuration-dependent 2×2 Jacobian of the leg linkage.
//!
//! The linkage is a symmetric two-link leg: `theta` is the leg angle,
//! `gamma` the spread angle between the upper links. Leg extension
//! `L(gamma) = a·cos(gamma) + sqrt(b² − a²·sin²(gamma))` with proximal
//! link `a` and distal link `b`; the foot sits at
//! `x = L·sin(theta)`, `y = −L·cos(theta)`.

use helix_common::consts::ENCODER_CPR;
use std::f64::consts::PI;

/// Convert a raw encoder count to a joint angle in radians.
///
/// Pure and stateless: linear in `counts`, inversely proportional to
/// `gear_ratio`. Also valid for velocities (counts/s → rad/s).
#[inline]
pub fn encoder_to_rad(counts: f64, gear_ratio: f64) -> f64 {
    counts * 2.0 * PI / (ENCODER_CPR * gear_ratio)
}

/// Independent PD law on one coordinate.
///
/// ```text
/// out = kp × (setpoint − measured) − kd × measured_velocity
/// ```
///
/// Used both per joint (output in N·m) and per Cartesian axis (output in N).
#[inline]
pub fn pd(kp: f64, kd: f64, setpoint: f64, measured: f64, measured_velocity: f64) -> f64 {
    kp * (setpoint - measured) - kd * measured_velocity
}

/// Convert a joint torque to an actuator current command.
///
/// `current = tau / (torque_constant × gear_ratio)` — no clamping here,
/// the driver is the last line of defense.
#[inline]
pub fn torque_to_current(tau: f64, torque_constant: f64, gear_ratio: f64) -> f64 {
    tau / (torque_constant * gear_ratio)
}

// ─── Jacobian ───────────────────────────────────────────────────────

/// Instantaneous 2×2 Jacobian `∂(x, y)/∂(theta, gamma)`.
///
/// Configuration-dependent: recomputed from the current joint angles every
/// tick it is used, never persisted across ticks as stale data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jacobian2 {
    pub j00: f64,
    pub j01: f64,
    pub j10: f64,
    pub j11: f64,
}

impl Jacobian2 {
    /// Map joint velocities to Cartesian velocities: `(ẋ, ẏ) = J·(θ̇, γ̇)`.
    #[inline]
    pub fn mul(&self, theta_vel: f64, gamma_vel: f64) -> (f64, f64) {
        (
            self.j00 * theta_vel + self.j01 * gamma_vel,
            self.j10 * theta_vel + self.j11 * gamma_vel,
        )
    }

    /// Map a workspace force to joint torques: `(τθ, τγ) = Jᵀ·(Fx, Fy)`.
    #[inline]
    pub fn transpose_mul(&self, force_x: f64, force_y: f64) -> (f64, f64) {
        (
            self.j00 * force_x + self.j10 * force_y,
            self.j01 * force_x + self.j11 * force_y,
        )
    }

    /// Determinant.
    #[inline]
    pub fn det(&self) -> f64 {
        self.j00 * self.j11 - self.j01 * self.j10
    }

    /// Inverse-transpose map `(Fx, Fy) = J⁻ᵀ·(τθ, τγ)`, or `None` near a
    /// singular configuration.
    pub fn inverse_transpose_mul(&self, tau_theta: f64, tau_gamma: f64) -> Option<(f64, f64)> {
        let det = self.det();
        if det.abs() < 1e-12 {
            return None;
        }
        // J⁻¹ = 1/det × [[j11, −j01], [−j10, j00]]; transpose of that.
        Some((
            (self.j11 * tau_theta - self.j10 * tau_gamma) / det,
            (-self.j01 * tau_theta + self.j00 * tau_gamma) / det,
        ))
    }
}

// ─── Leg geometry ───────────────────────────────────────────────────

/// Physical linkage parameters — supplied by configuration, not re-derived.
#[derive(Debug, Clone, Copy)]
pub struct LegGeometry {
    /// Proximal link length [m].
    pub link_a: f64,
    /// Distal link length [m].
    pub link_b: f64,
}

impl LegGeometry {
    /// Leg extension `L(gamma)` [m].
    #[inline]
    fn extension(&self, gamma: f64) -> f64 {
        let s = gamma.sin();
        self.link_a * gamma.cos() + (self.link_b * self.link_b - self.link_a * self.link_a * s * s).sqrt()
    }

    /// `dL/dgamma` [m/rad].
    #[inline]
    fn extension_derivative(&self, gamma: f64) -> f64 {
        let s = gamma.sin();
        let c = gamma.cos();
        let root = (self.link_b * self.link_b - self.link_a * self.link_a * s * s).sqrt();
        -self.link_a * s - self.link_a * self.link_a * s * c / root
    }

    /// Forward kinematics: joint angles to foot position `(x, y)` [m].
    pub fn forward(&self, theta: f64, gamma: f64) -> (f64, f64) {
        let l = self.extension(gamma);
        (l * theta.sin(), -l * theta.cos())
    }

    /// Jacobian of [`Self::forward`] at the given configuration.
    pub fn jacobian(&self, theta: f64, gamma: f64) -> Jacobian2 {
        let l = self.extension(gamma);
        let dl = self.extension_derivative(gamma);
        let (st, ct) = theta.sin_cos();
        Jacobian2 {
            j00: l * ct,
            j01: dl * st,
            j10: l * st,
            j11: -dl * ct,
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
