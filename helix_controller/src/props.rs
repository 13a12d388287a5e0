//! Remote property/function exposition table.
//!
//! Statically-declared mapping from names to typed field accessors and
//! typed function invokers, built once at compile time. The communication
//! layer that transports reads/writes/calls is out of scope — it consumes
//! this table; the controller itself only exposes plain typed accessors.

use helix_common::mode::ControlMode;

use crate::controller::Controller;

/// A typed property value crossing the exposition boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropValue {
    Float(f64),
    Bool(bool),
    Uint(u32),
    Mode(ControlMode),
}

/// One named property: a typed getter and an optional typed setter.
///
/// A setter returns `false` when handed the wrong value type.
pub struct PropertyDef {
    pub name: &'static str,
    pub read: fn(&Controller) -> PropValue,
    pub write: Option<fn(&mut Controller, PropValue) -> bool>,
}

/// One named invocable function with its ordered argument names.
///
/// `invoke` returns `false` on arity mismatch or when the controller
/// refuses the operation.
pub struct FunctionDef {
    pub name: &'static str,
    pub args: &'static [&'static str],
    pub invoke: fn(&mut Controller, &[f64]) -> bool,
}

macro_rules! state_prop {
    ($name:literal, $field:ident) => {
        PropertyDef {
            name: $name,
            read: |c| PropValue::Float(c.state().$field),
            write: Some(|c, v| match v {
                PropValue::Float(x) => {
                    c.state_mut().$field = x;
                    true
                }
                _ => false,
            }),
        }
    };
}

macro_rules! config_prop {
    ($name:literal, $field:ident) => {
        PropertyDef {
            name: $name,
            read: |c| PropValue::Float(c.config().$field),
            write: Some(|c, v| match v {
                PropValue::Float(x) => {
                    c.config_mut().$field = x;
                    true
                }
                _ => false,
            }),
        }
    };
}

/// Every state, config and anticogging field, readable and writable by
/// name. Writes that would break an internal invariant route through the
/// guarded controller methods instead of raw field stores.
pub static PROPERTIES: &[PropertyDef] = &[
    // ─── Per-tick state ─────────────────────────────
    state_prop!("pos_setpoint", pos_setpoint),
    state_prop!("vel_setpoint", vel_setpoint),
    state_prop!("vel_integrator_current", vel_integrator_current),
    state_prop!("current_setpoint", current_setpoint),
    state_prop!("theta", theta),
    state_prop!("gamma", gamma),
    state_prop!("theta_setpoint", theta_setpoint),
    state_prop!("gamma_setpoint", gamma_setpoint),
    state_prop!("tau_theta", tau_theta),
    state_prop!("tau_gamma", tau_gamma),
    state_prop!("x_pos", x_pos),
    state_prop!("y_pos", y_pos),
    state_prop!("x_setpoint", x_setpoint),
    state_prop!("y_setpoint", y_setpoint),
    state_prop!("force_x", force_x),
    state_prop!("force_y", force_y),
    state_prop!("J00", j00),
    state_prop!("J01", j01),
    state_prop!("J10", j10),
    state_prop!("J11", j11),
    // ─── Config ─────────────────────────────────────
    PropertyDef {
        name: "control_mode",
        read: |c| PropValue::Mode(c.config().control_mode),
        write: Some(|c, v| match v {
            PropValue::Mode(mode) => {
                c.set_mode(mode);
                true
            }
            _ => false,
        }),
    },
    config_prop!("pos_gain", pos_gain),
    config_prop!("vel_gain", vel_gain),
    config_prop!("vel_integrator_gain", vel_integrator_gain),
    config_prop!("vel_limit", vel_limit),
    config_prop!("kp_theta", kp_theta),
    config_prop!("kd_theta", kd_theta),
    config_prop!("kp_gamma", kp_gamma),
    config_prop!("kd_gamma", kd_gamma),
    config_prop!("kp_x", kp_x),
    config_prop!("kd_x", kd_x),
    config_prop!("kp_y", kp_y),
    config_prop!("kd_y", kd_y),
    config_prop!("gear_ratio", gear_ratio),
    config_prop!("torque_constant", torque_constant),
    config_prop!("link_a", link_a),
    config_prop!("link_b", link_b),
    // ─── Anticogging ────────────────────────────────
    PropertyDef {
        name: "anticogging.index",
        read: |c| PropValue::Uint(c.anticogging().index() as u32),
        write: Some(|c, v| match v {
            PropValue::Uint(i) => c.anticogging_mut().set_index(i as usize),
            _ => false,
        }),
    },
    PropertyDef {
        name: "anticogging.use_anticogging",
        read: |c| PropValue::Bool(c.anticogging().use_anticogging),
        write: Some(|c, v| match v {
            PropValue::Bool(b) => {
                c.anticogging_mut().use_anticogging = b;
                true
            }
            _ => false,
        }),
    },
    PropertyDef {
        name: "anticogging.calib_anticogging",
        read: |c| PropValue::Bool(c.anticogging().is_calibrating()),
        // Raising the flag routes through the guarded start (map
        // allocation, axis run-state check); clearing it aborts.
        write: Some(|c, v| match v {
            PropValue::Bool(true) => c.start_anticogging_calibration(),
            PropValue::Bool(false) => {
                c.abort_anticogging_calibration();
                true
            }
            _ => false,
        }),
    },
    PropertyDef {
        name: "anticogging.calib_pos_threshold",
        read: |c| PropValue::Float(c.anticogging().calib_pos_threshold),
        write: Some(|c, v| match v {
            PropValue::Float(x) => {
                c.anticogging_mut().calib_pos_threshold = x;
                true
            }
            _ => false,
        }),
    },
    PropertyDef {
        name: "anticogging.calib_vel_threshold",
        read: |c| PropValue::Float(c.anticogging().calib_vel_threshold),
        write: Some(|c, v| match v {
            PropValue::Float(x) => {
                c.anticogging_mut().calib_vel_threshold = x;
                true
            }
            _ => false,
        }),
    },
];

/// Every remotely invocable setpoint/calibration function.
pub static FUNCTIONS: &[FunctionDef] = &[
    FunctionDef {
        name: "set_pos_setpoint",
        args: &["pos_setpoint", "vel_feed_forward", "current_feed_forward"],
        invoke: |c, a| match a {
            [pos, vel_ff, cur_ff] => {
                c.set_pos_setpoint(*pos, *vel_ff, *cur_ff);
                true
            }
            _ => false,
        },
    },
    FunctionDef {
        name: "set_vel_setpoint",
        args: &["vel_setpoint", "current_feed_forward"],
        invoke: |c, a| match a {
            [vel, cur_ff] => {
                c.set_vel_setpoint(*vel, *cur_ff);
                true
            }
            _ => false,
        },
    },
    FunctionDef {
        name: "set_current_setpoint",
        args: &["current_setpoint"],
        invoke: |c, a| match a {
            [cur] => {
                c.set_current_setpoint(*cur);
                true
            }
            _ => false,
        },
    },
    FunctionDef {
        name: "set_coupled_setpoints",
        args: &["theta_setpoint", "gamma_setpoint"],
        invoke: |c, a| match a {
            [theta, gamma] => {
                c.set_coupled_setpoints(*theta, *gamma);
                true
            }
            _ => false,
        },
    },
    FunctionDef {
        name: "set_coupled_gains",
        args: &["kp_theta", "kd_theta", "kp_gamma", "kd_gamma"],
        invoke: |c, a| match a {
            [kp_t, kd_t, kp_g, kd_g] => {
                c.set_coupled_gains(*kp_t, *kd_t, *kp_g, *kd_g);
                true
            }
            _ => false,
        },
    },
    FunctionDef {
        name: "set_xy_setpoints",
        args: &["x_setpoint", "y_setpoint"],
        invoke: |c, a| match a {
            [x, y] => {
                c.set_xy_setpoints(*x, *y);
                true
            }
            _ => false,
        },
    },
    FunctionDef {
        name: "set_xy_gains",
        args: &["kp_x", "kd_x", "kp_y", "kd_y"],
        invoke: |c, a| match a {
            [kp_x, kd_x, kp_y, kd_y] => {
                c.set_xy_gains(*kp_x, *kd_x, *kp_y, *kd_y);
                true
            }
            _ => false,
        },
    },
    FunctionDef {
        name: "start_anticogging_calibration",
        args: &[],
        invoke: |c, a| a.is_empty() && c.start_anticogging_calibration(),
    },
];

/// Look up a property by name.
pub fn find_property(name: &str) -> Option<&'static PropertyDef> {
    PROPERTIES.iter().find(|p| p.name == name)
}

/// Look up a function by name.
pub fn find_function(name: &str) -> Option<&'static FunctionDef> {
    FUNCTIONS.iter().find(|f| f.name == name)
}

// ─── Tests ──────────────────────────────────────────────────────────
