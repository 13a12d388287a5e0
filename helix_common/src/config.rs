//! Controller tuning record.
//!
//! `ControlConfig` is immutable during a control run: it is written only by
//! the remote-property layer between ticks and read by the control law.
//! Every field carries a serde default so a partial TOML table loads with
//! the firmware defaults filled in.

use serde::{Deserialize, Serialize};

use crate::consts;
use crate::mode::ControlMode;

/// Tuning record for one axis controller.
///
/// Scalar gains drive the cascaded position → velocity → current law;
/// the `kp_*`/`kd_*` pairs drive the coupled-joint and Cartesian PD laws.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Active control mode.
    #[serde(default)]
    pub control_mode: ControlMode,

    // ─── Scalar cascade ─────────────────────────────
    /// Position gain [(counts/s) / counts].
    #[serde(default = "default_pos_gain")]
    pub pos_gain: f64,
    /// Velocity gain [A/(counts/s)].
    #[serde(default = "default_vel_gain")]
    pub vel_gain: f64,
    /// Velocity integrator gain [A/((counts/s)·s)].
    #[serde(default = "default_vel_integrator_gain")]
    pub vel_integrator_gain: f64,
    /// Velocity command limit [counts/s]. Bounds the achievable velocity
    /// command, not the raw current.
    #[serde(default = "default_vel_limit")]
    pub vel_limit: f64,

    // ─── Coupled-joint PD ───────────────────────────
    /// Proportional gain, theta joint [N·m/rad].
    #[serde(default = "default_kp_theta")]
    pub kp_theta: f64,
    /// Derivative gain, theta joint [N·m/(rad/s)].
    #[serde(default = "default_kd_theta")]
    pub kd_theta: f64,
    /// Proportional gain, gamma joint [N·m/rad].
    #[serde(default = "default_kp_gamma")]
    pub kp_gamma: f64,
    /// Derivative gain, gamma joint [N·m/(rad/s)].
    #[serde(default = "default_kd_gamma")]
    pub kd_gamma: f64,

    // ─── Cartesian PD ───────────────────────────────
    /// Proportional gain, x axis [N/m] (0 = disabled).
    #[serde(default)]
    pub kp_x: f64,
    /// Derivative gain, x axis [N/(m/s)] (0 = disabled).
    #[serde(default)]
    pub kd_x: f64,
    /// Proportional gain, y axis [N/m] (0 = disabled).
    #[serde(default)]
    pub kp_y: f64,
    /// Derivative gain, y axis [N/(m/s)] (0 = disabled).
    #[serde(default)]
    pub kd_y: f64,

    // ─── Actuator / linkage geometry ────────────────
    /// Gear ratio between motor shaft and joint.
    #[serde(default = "default_gear_ratio")]
    pub gear_ratio: f64,
    /// Actuator torque constant [N·m/A].
    #[serde(default = "default_torque_constant")]
    pub torque_constant: f64,
    /// Proximal link length [m].
    #[serde(default = "default_link_a")]
    pub link_a: f64,
    /// Distal link length [m].
    #[serde(default = "default_link_b")]
    pub link_b: f64,
}

fn default_pos_gain() -> f64 {
    consts::DEFAULT_POS_GAIN
}
fn default_vel_gain() -> f64 {
    consts::DEFAULT_VEL_GAIN
}
fn default_vel_integrator_gain() -> f64 {
    consts::DEFAULT_VEL_INTEGRATOR_GAIN
}
fn default_vel_limit() -> f64 {
    consts::DEFAULT_VEL_LIMIT
}
fn default_kp_theta() -> f64 {
    consts::DEFAULT_KP_THETA
}
fn default_kd_theta() -> f64 {
    consts::DEFAULT_KD_THETA
}
fn default_kp_gamma() -> f64 {
    consts::DEFAULT_KP_GAMMA
}
fn default_kd_gamma() -> f64 {
    consts::DEFAULT_KD_GAMMA
}
fn default_gear_ratio() -> f64 {
    consts::DEFAULT_GEAR_RATIO
}
fn default_torque_constant() -> f64 {
    consts::DEFAULT_TORQUE_CONSTANT
}
fn default_link_a() -> f64 {
    consts::DEFAULT_LINK_A
}
fn default_link_b() -> f64 {
    consts::DEFAULT_LINK_B
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            control_mode: ControlMode::default(),
            pos_gain: default_pos_gain(),
            vel_gain: default_vel_gain(),
            vel_integrator_gain: default_vel_integrator_gain(),
            vel_limit: default_vel_limit(),
            kp_theta: default_kp_theta(),
            kd_theta: default_kd_theta(),
            kp_gamma: default_kp_gamma(),
            kd_gamma: default_kd_gamma(),
            kp_x: 0.0,
            kd_x: 0.0,
            kp_y: 0.0,
            kd_y: 0.0,
            gear_ratio: default_gear_ratio(),
            torque_constant: default_torque_constant(),
            link_a: default_link_a(),
            link_b: default_link_b(),
        }
    }
}

impl ControlConfig {
    /// Validate parameter bounds.
    ///
    /// All gains must be finite; the limits and physical parameters must
    /// be strictly positive. Setpoint values are deliberately *not*
    /// validated anywhere — that contract belongs to the caller.
    pub fn validate(&self) -> Result<(), String> {
        let gains = [
            ("pos_gain", self.pos_gain),
            ("vel_gain", self.vel_gain),
            ("vel_integrator_gain", self.vel_integrator_gain),
            ("kp_theta", self.kp_theta),
            ("kd_theta", self.kd_theta),
            ("kp_gamma", self.kp_gamma),
            ("kd_gamma", self.kd_gamma),
            ("kp_x", self.kp_x),
            ("kd_x", self.kd_x),
            ("kp_y", self.kp_y),
            ("kd_y", self.kd_y),
        ];
        for (name, value) in gains {
            if !value.is_finite() {
                return Err(format!("{name} must be finite, got {value}"));
            }
        }

        if !(self.vel_limit.is_finite() && self.vel_limit > 0.0) {
            return Err(format!("vel_limit must be > 0, got {}", self.vel_limit));
        }
        if !(self.gear_ratio.is_finite() && self.gear_ratio > 0.0) {
            return Err(format!("gear_ratio must be > 0, got {}", self.gear_ratio));
        }
        if !(self.torque_constant.is_finite() && self.torque_constant > 0.0) {
            return Err(format!(
                "torque_constant must be > 0, got {}",
                self.torque_constant
            ));
        }
        if !(self.link_a.is_finite() && self.link_a > 0.0) {
            return Err(format!("link_a must be > 0, got {}", self.link_a));
        }
        if !(self.link_b.is_finite() && self.link_b > 0.0) {
            return Err(format!("link_b must be > 0, got {}", self.link_b));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = ControlConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.control_mode, ControlMode::Position);
        assert!((cfg.pos_gain - 0.01).abs() < 1e-12);
        assert!((cfg.vel_gain - 5e-4).abs() < 1e-12);
        assert!((cfg.vel_integrator_gain - 1e-3).abs() < 1e-12);
        assert!((cfg.vel_limit - 20_000.0).abs() < 1e-12);
        assert!((cfg.gear_ratio - 4.0).abs() < 1e-12);
    }

    #[test]
    fn cartesian_gains_default_to_disabled() {
        let cfg = ControlConfig::default();
        assert_eq!(cfg.kp_x, 0.0);
        assert_eq!(cfg.kd_x, 0.0);
        assert_eq!(cfg.kp_y, 0.0);
        assert_eq!(cfg.kd_y, 0.0);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: ControlConfig = toml::from_str(
            r#"
            control_mode = "velocity"
            vel_limit = 5000.0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.control_mode, ControlMode::Velocity);
        assert!((cfg.vel_limit - 5000.0).abs() < 1e-12);
        // Untouched fields keep the firmware defaults.
        assert!((cfg.pos_gain - 0.01).abs() < 1e-12);
        assert!((cfg.gear_ratio - 4.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_nonpositive_vel_limit() {
        let cfg = ControlConfig {
            vel_limit: 0.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_nan_gain() {
        let cfg = ControlConfig {
            vel_gain: f64::NAN,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_nonpositive_geometry() {
        let cfg = ControlConfig {
            link_a: -0.1,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = ControlConfig {
            gear_ratio: 0.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
