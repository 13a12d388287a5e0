//! The per-axis feedback controller.
//!
//! One instance per axis. The owning axis calls [`Controller::update`]
//! (or [`Controller::update_coupled`] in the two-actuator modes) exactly
//! once per control tick with the latest sensed position/velocity; the
//! remote-property layer writes setpoints and gains between ticks through
//! the setter methods. The owner serializes the two contexts — a setter
//! that completes before a tick begins is visible to that tick.

use std::mem;
use std::sync::Weak;

use tracing::warn;

use helix_common::command::CoupledCommand;
use helix_common::config::ControlConfig;
use helix_common::consts::{COGGING_MAP_SIZE, CONTROL_TICK_PERIOD, ENCODER_CPR};
use helix_common::error::ControlError;
use helix_common::mode::ControlMode;

use crate::axis::AxisLink;
use crate::control::anticogging::AnticoggingState;
use crate::control::cascade::{self, ScalarGains};
use crate::control::kinematics::{self, LegGeometry};

/// Resting gamma angle and setpoint [rad] — leg folded straight down.
const GAMMA_REST: f64 = std::f64::consts::FRAC_PI_2;

/// Resting Cartesian y setpoint [m].
const Y_REST: f64 = 0.13;

/// Per-joint encoder feedback for the coupled entry point [counts, counts/s].
#[derive(Debug, Clone, Copy, Default)]
pub struct JointFeedback {
    /// Position estimate [counts].
    pub pos: f64,
    /// Velocity estimate [counts/s].
    pub vel: f64,
}

// ─── ControllerState ────────────────────────────────────────────────

/// Mutable per-tick controller state.
///
/// Constructed once per axis; reset to its rest values on mode change or
/// explicit [`Controller::reset`]. Every field is exposed by name on the
/// remote-property surface.
#[derive(Debug, Clone, Copy)]
pub struct ControllerState {
    /// Position setpoint [counts].
    pub pos_setpoint: f64,
    /// Velocity setpoint [counts/s].
    pub vel_setpoint: f64,
    /// Accumulated velocity-loop integral term [A]. Unbounded by design.
    pub vel_integrator_current: f64,
    /// Current setpoint / last computed current command [A].
    pub current_setpoint: f64,

    /// Measured theta joint angle [rad].
    pub theta: f64,
    /// Measured gamma joint angle [rad].
    pub gamma: f64,
    /// Theta setpoint [rad].
    pub theta_setpoint: f64,
    /// Gamma setpoint [rad].
    pub gamma_setpoint: f64,
    /// Last computed theta joint torque [N·m].
    pub tau_theta: f64,
    /// Last computed gamma joint torque [N·m].
    pub tau_gamma: f64,

    /// Measured foot x position [m].
    pub x_pos: f64,
    /// Measured foot y position [m].
    pub y_pos: f64,
    /// Cartesian x setpoint [m].
    pub x_setpoint: f64,
    /// Cartesian y setpoint [m].
    pub y_setpoint: f64,
    /// Last computed Cartesian x force [N].
    pub force_x: f64,
    /// Last computed Cartesian y force [N].
    pub force_y: f64,

    /// Live Jacobian entries — recomputed from the current joint angles on
    /// every coupled tick, never carried over stale.
    pub j00: f64,
    pub j01: f64,
    pub j10: f64,
    pub j11: f64,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            pos_setpoint: 0.0,
            vel_setpoint: 0.0,
            vel_integrator_current: 0.0,
            current_setpoint: 0.0,
            theta: 0.0,
            gamma: GAMMA_REST,
            theta_setpoint: 0.0,
            gamma_setpoint: GAMMA_REST,
            tau_theta: 0.0,
            tau_gamma: 0.0,
            x_pos: 0.0,
            y_pos: 0.0,
            x_setpoint: 0.0,
            y_setpoint: Y_REST,
            force_x: 0.0,
            force_y: 0.0,
            j00: 0.0,
            j01: 0.0,
            j10: 0.0,
            j11: 0.0,
        }
    }
}

// ─── Controller ─────────────────────────────────────────────────────

/// Cascaded feedback controller for one axis.
#[derive(Debug, Clone)]
pub struct Controller {
    config: ControlConfig,
    state: ControllerState,
    anticogging: AnticoggingState,
    /// One-shot velocity feed-forward, consumed by the next tick.
    pending_vel_ff: f64,
    /// One-shot current feed-forward, consumed by the next tick.
    pending_current_ff: f64,
    /// Fixed tick period [s].
    tick_period: f64,
    /// Non-owning back-link to the owning axis, set during assembly.
    axis: Option<Weak<dyn AxisLink>>,
}

impl Controller {
    /// Build a controller from a validated config.
    pub fn new(config: ControlConfig) -> Self {
        Self {
            config,
            state: ControllerState::default(),
            anticogging: AnticoggingState::default(),
            pending_vel_ff: 0.0,
            pending_current_ff: 0.0,
            tick_period: CONTROL_TICK_PERIOD,
            axis: None,
        }
    }

    /// Attach the owning axis (non-owning weak association).
    pub fn attach_axis(&mut self, axis: Weak<dyn AxisLink>) {
        self.axis = Some(axis);
    }

    /// Tuning record.
    #[inline]
    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Mutable tuning record — remote-property writes between ticks.
    #[inline]
    pub fn config_mut(&mut self) -> &mut ControlConfig {
        &mut self.config
    }

    /// Per-tick state.
    #[inline]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Mutable per-tick state — remote-property writes between ticks.
    #[inline]
    pub fn state_mut(&mut self) -> &mut ControllerState {
        &mut self.state
    }

    /// Anticogging state.
    #[inline]
    pub fn anticogging(&self) -> &AnticoggingState {
        &self.anticogging
    }

    /// Mutable anticogging state (thresholds, enable flag).
    #[inline]
    pub fn anticogging_mut(&mut self) -> &mut AnticoggingState {
        &mut self.anticogging
    }

    /// Zero all dynamic state back to the rest values.
    ///
    /// Pending feed-forward terms are discarded; the cogging map and its
    /// flags are untouched.
    pub fn reset(&mut self) {
        self.state = ControllerState::default();
        self.pending_vel_ff = 0.0;
        self.pending_current_ff = 0.0;
    }

    /// Switch control mode.
    ///
    /// Resets dynamic state and aborts any calibration sweep in progress
    /// (recorded map entries are kept).
    pub fn set_mode(&mut self, mode: ControlMode) {
        self.anticogging.abort();
        self.config.control_mode = mode;
        self.reset();
    }

    /// One mechanical revolution in encoder counts.
    #[inline]
    fn counts_per_mech_rev(&self) -> f64 {
        ENCODER_CPR * self.config.gear_ratio
    }

    /// Convert a raw encoder count to radians for this axis's gear ratio.
    #[inline]
    pub fn encoder_to_rad(&self, counts: f64) -> f64 {
        kinematics::encoder_to_rad(counts, self.config.gear_ratio)
    }

    // ─── Setpoint & gain store ──────────────────────────────────────
    //
    // All setters are O(1) field writes: no validation, no blocking, no
    // allocation. Out-of-range values are the caller's responsibility.

    /// Position setpoint with one-shot velocity/current feed-forward.
    ///
    /// The feed-forward terms are not stored as state — they are applied
    /// exactly once, on the next `update` tick. Repeated calls must each
    /// supply fresh feed-forward values.
    pub fn set_pos_setpoint(
        &mut self,
        pos_setpoint: f64,
        vel_feed_forward: f64,
        current_feed_forward: f64,
    ) {
        self.state.pos_setpoint = pos_setpoint;
        self.pending_vel_ff = vel_feed_forward;
        self.pending_current_ff = current_feed_forward;
    }

    /// Velocity setpoint with one-shot current feed-forward.
    pub fn set_vel_setpoint(&mut self, vel_setpoint: f64, current_feed_forward: f64) {
        self.state.vel_setpoint = vel_setpoint;
        self.pending_current_ff = current_feed_forward;
    }

    /// Current setpoint (identity law in current mode).
    pub fn set_current_setpoint(&mut self, current_setpoint: f64) {
        self.state.current_setpoint = current_setpoint;
    }

    /// Joint-space setpoints for coupled mode [rad].
    pub fn set_coupled_setpoints(&mut self, theta_setpoint: f64, gamma_setpoint: f64) {
        self.state.theta_setpoint = theta_setpoint;
        self.state.gamma_setpoint = gamma_setpoint;
    }

    /// Joint-space PD gains, effective on the next tick.
    pub fn set_coupled_gains(&mut self, kp_theta: f64, kd_theta: f64, kp_gamma: f64, kd_gamma: f64) {
        self.config.kp_theta = kp_theta;
        self.config.kd_theta = kd_theta;
        self.config.kp_gamma = kp_gamma;
        self.config.kd_gamma = kd_gamma;
    }

    /// Cartesian setpoints for xy mode [m].
    pub fn set_xy_setpoints(&mut self, x_setpoint: f64, y_setpoint: f64) {
        self.state.x_setpoint = x_setpoint;
        self.state.y_setpoint = y_setpoint;
    }

    /// Cartesian PD gains, effective on the next tick.
    pub fn set_xy_gains(&mut self, kp_x: f64, kd_x: f64, kp_y: f64, kd_y: f64) {
        self.config.kp_x = kp_x;
        self.config.kd_x = kd_x;
        self.config.kp_y = kp_y;
        self.config.kd_y = kd_y;
    }

    // ─── Scalar control tick ────────────────────────────────────────

    /// One scalar control tick.
    ///
    /// Dispatches on the active mode:
    /// - `Position`: derive the velocity command from position error plus
    ///   the one-shot velocity feed-forward, then fall through.
    /// - `Velocity`: clamp the velocity command to `±vel_limit`, run the
    ///   PI law plus the one-shot current feed-forward.
    /// - `Current`: identity — the stored setpoint passes through exactly.
    /// - `Voltage`: placeholder level, no current command (`Ok(None)`).
    ///
    /// The one-shot feed-forward terms are consumed by every scalar tick,
    /// including the modes that ignore them.
    ///
    /// While a calibration sweep is active, the sweep step runs first and
    /// re-asserts the internal position target, then the position cascade
    /// actuates it.
    ///
    /// # Errors
    /// [`ControlError::ModeMismatch`] when a coupled mode is active;
    /// [`ControlError::CalibrationState`] when the calibrating flag is
    /// raised without an allocated map. On error the caller is responsible
    /// for halting actuation.
    pub fn update(
        &mut self,
        pos_estimate: f64,
        vel_estimate: f64,
    ) -> Result<Option<f64>, ControlError> {
        let mode = self.config.control_mode;
        if mode.is_coupled() {
            return Err(ControlError::ModeMismatch { mode });
        }

        if self.anticogging.is_calibrating() {
            if !self.anticogging.has_map() {
                return Err(ControlError::CalibrationState {
                    reason: "calibrating flag raised without an allocated map",
                });
            }
            self.anticogging_calibration(pos_estimate, vel_estimate);
        }

        // Every scalar tick consumes the one-shot terms, even in modes
        // that ignore them — a stale latch must never leak into a later
        // mode change.
        let vel_ff = mem::take(&mut self.pending_vel_ff);
        let current_ff = mem::take(&mut self.pending_current_ff);

        let command = match mode {
            ControlMode::Voltage => None,
            ControlMode::Current => Some(self.state.current_setpoint),
            _ => {
                let gains = ScalarGains {
                    pos_gain: self.config.pos_gain,
                    vel_gain: self.config.vel_gain,
                    vel_integrator_gain: self.config.vel_integrator_gain,
                    vel_limit: self.config.vel_limit,
                };

                let mut vel_des = self.state.vel_setpoint;
                if mode >= ControlMode::Position {
                    vel_des = cascade::position_to_velocity(
                        &gains,
                        self.state.pos_setpoint,
                        pos_estimate,
                        vel_ff,
                    );
                }
                let vel_des = cascade::clamp_velocity(&gains, vel_des);

                let mut current = cascade::velocity_to_current(
                    &mut self.state.vel_integrator_current,
                    &gains,
                    vel_des,
                    vel_estimate,
                    current_ff,
                    self.tick_period,
                );
                current += self
                    .anticogging
                    .compensation(pos_estimate, self.counts_per_mech_rev());
                self.state.current_setpoint = current;
                Some(current)
            }
        };

        Ok(command)
    }

    // ─── Coupled control tick ───────────────────────────────────────

    /// One coupled/xy control tick — two current commands, one per
    /// physical actuator.
    ///
    /// Joint angles and velocities come from each actuator's encoder via
    /// [`Self::encoder_to_rad`]. The Jacobian is recomputed from the
    /// measured angles before any use and mirrored into state.
    ///
    /// # Errors
    /// [`ControlError::ModeMismatch`] when a scalar mode is active.
    pub fn update_coupled(
        &mut self,
        theta_feedback: JointFeedback,
        gamma_feedback: JointFeedback,
    ) -> Result<CoupledCommand, ControlError> {
        let mode = self.config.control_mode;

        let theta = self.encoder_to_rad(theta_feedback.pos);
        let gamma = self.encoder_to_rad(gamma_feedback.pos);
        let theta_vel = self.encoder_to_rad(theta_feedback.vel);
        let gamma_vel = self.encoder_to_rad(gamma_feedback.vel);

        let geometry = LegGeometry {
            link_a: self.config.link_a,
            link_b: self.config.link_b,
        };
        let jacobian = geometry.jacobian(theta, gamma);

        let (tau_theta, tau_gamma) = match mode {
            ControlMode::Coupled => (
                kinematics::pd(
                    self.config.kp_theta,
                    self.config.kd_theta,
                    self.state.theta_setpoint,
                    theta,
                    theta_vel,
                ),
                kinematics::pd(
                    self.config.kp_gamma,
                    self.config.kd_gamma,
                    self.state.gamma_setpoint,
                    gamma,
                    gamma_vel,
                ),
            ),
            ControlMode::Xy => {
                let (x, y) = geometry.forward(theta, gamma);
                let (x_vel, y_vel) = jacobian.mul(theta_vel, gamma_vel);
                let force_x = kinematics::pd(
                    self.config.kp_x,
                    self.config.kd_x,
                    self.state.x_setpoint,
                    x,
                    x_vel,
                );
                let force_y = kinematics::pd(
                    self.config.kp_y,
                    self.config.kd_y,
                    self.state.y_setpoint,
                    y,
                    y_vel,
                );
                self.state.x_pos = x;
                self.state.y_pos = y;
                self.state.force_x = force_x;
                self.state.force_y = force_y;
                jacobian.transpose_mul(force_x, force_y)
            }
            other => return Err(ControlError::ModeMismatch { mode: other }),
        };

        self.state.theta = theta;
        self.state.gamma = gamma;
        self.state.j00 = jacobian.j00;
        self.state.j01 = jacobian.j01;
        self.state.j10 = jacobian.j10;
        self.state.j11 = jacobian.j11;
        self.state.tau_theta = tau_theta;
        self.state.tau_gamma = tau_gamma;

        Ok(CoupledCommand {
            current_theta: kinematics::torque_to_current(
                tau_theta,
                self.config.torque_constant,
                self.config.gear_ratio,
            ),
            current_gamma: kinematics::torque_to_current(
                tau_gamma,
                self.config.torque_constant,
                self.config.gear_ratio,
            ),
        })
    }

    // ─── Anticogging calibration ────────────────────────────────────

    /// Begin an anticogging calibration sweep.
    ///
    /// Allocates the cogging map on first use (not real-time safe — call
    /// outside the tightest timing budget). Refused when an attached axis
    /// reports it is not running. Returns whether the sweep started.
    pub fn start_anticogging_calibration(&mut self) -> bool {
        if let Some(axis) = self.axis.as_ref().and_then(Weak::upgrade) {
            if !axis.is_running() {
                warn!("anticogging calibration refused: axis not running");
                return false;
            }
        }
        self.anticogging.start(COGGING_MAP_SIZE);
        true
    }

    /// Abort a calibration sweep in progress.
    ///
    /// Already-recorded map entries stay intact; the map is not marked
    /// usable.
    pub fn abort_anticogging_calibration(&mut self) {
        self.anticogging.abort();
    }

    /// One calibration tick: settle check, sample record, index advance.
    ///
    /// The first tick anchors the sweep at `pos_estimate`; the targets
    /// then run from that anchor across one mechanical revolution in
    /// fixed increments.
    /// Re-asserts the internally-driven position target, overriding any
    /// externally written `pos_setpoint` — external setpoint commands are
    /// accepted while calibrating but have no observable effect on
    /// actuation until the sweep ends.
    ///
    /// Returns `true` exactly once, when the sweep completes. Thresholds
    /// that are never satisfied stall the sweep forever; there is no
    /// internal timeout, the owner decides when to abort.
    pub fn anticogging_calibration(&mut self, pos_estimate: f64, vel_estimate: f64) -> bool {
        let rev = self.counts_per_mech_rev();
        let done = self.anticogging.step(
            pos_estimate,
            vel_estimate,
            self.state.vel_integrator_current,
            rev,
        );
        self.state.pos_setpoint = self.anticogging.target_position(rev);
        if done {
            if let Some(axis) = self.axis.as_ref().and_then(Weak::upgrade) {
                axis.on_calibration_complete();
            }
        }
        done
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
