//! Cascaded scalar control law: position P loop feeding a velocity PI loop.
//!
//! Position mode is velocity mode composed with an outer proportional
//! loop; current mode is an identity law and is handled by the caller.
//! The velocity command is clamped to `±vel_limit` *before* the error is
//! computed, so the limit bounds the achievable velocity command, not the
//! raw current.

/// Scalar-loop gains — extracted from `ControlConfig` for clarity.
#[derive(Debug, Clone, Copy)]
pub struct ScalarGains {
    /// Position gain [(counts/s) / counts].
    pub pos_gain: f64,
    /// Velocity gain [A/(counts/s)].
    pub vel_gain: f64,
    /// Velocity integrator gain [A/((counts/s)·s)].
    pub vel_integrator_gain: f64,
    /// Velocity command limit [counts/s].
    pub vel_limit: f64,
}

/// Outer position loop: derive a velocity command from position error.
///
/// ```text
/// vel_des = pos_gain × (pos_setpoint − pos_estimate) + vel_feed_forward
/// ```
///
/// The feed-forward term is a one-shot value supplied by the caller —
/// it is consumed here, never persisted.
#[inline]
pub fn position_to_velocity(
    gains: &ScalarGains,
    pos_setpoint: f64,
    pos_estimate: f64,
    vel_feed_forward: f64,
) -> f64 {
    gains.pos_gain * (pos_setpoint - pos_estimate) + vel_feed_forward
}

/// Clamp a velocity command to the configured limit.
#[inline]
pub fn clamp_velocity(gains: &ScalarGains, vel_des: f64) -> f64 {
    vel_des.clamp(-gains.vel_limit, gains.vel_limit)
}

/// Inner velocity PI loop: derive a current command from velocity error.
///
/// ```text
/// e       = vel_des − vel_estimate
/// current = vel_gain × e + integrator + current_feed_forward
/// ```
///
/// The integrator contributes its value from *previous* ticks and then
/// advances by `vel_integrator_gain × e` (forward Euler at the fixed tick
/// period `dt`). It is unbounded by design — no anti-windup at this layer.
///
/// # Arguments
/// - `integrator`: Accumulated integral current [A], advanced in place.
/// - `gains`: Scalar-loop gains.
/// - `vel_des`: Velocity command [counts/s], already clamped.
/// - `vel_estimate`: Measured velocity [counts/s].
/// - `current_feed_forward`: One-shot additive current term [A].
/// - `dt`: Tick period [s].
#[inline]
pub fn velocity_to_current(
    integrator: &mut f64,
    gains: &ScalarGains,
    vel_des: f64,
    vel_estimate: f64,
    current_feed_forward: f64,
    dt: f64,
) -> f64 {
    let error = vel_des - vel_estimate;
    let current = gains.vel_gain * error + *integrator + current_feed_forward;
    *integrator += gains.vel_integrator_gain * error * dt;
    current
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 8000.0;

    fn gains() -> ScalarGains {
        ScalarGains {
            pos_gain: 0.01,
            vel_gain: 5e-4,
            vel_integrator_gain: 1e-3,
            vel_limit: 20_000.0,
        }
    }

    #[test]
    fn position_loop_is_proportional() {
        let g = gains();
        let v = position_to_velocity(&g, 1000.0, 0.0, 0.0);
        assert!((v - 10.0).abs() < 1e-12);
    }

    #[test]
    fn position_loop_monotone_in_setpoint() {
        let g = gains();
        let mut prev = f64::NEG_INFINITY;
        for sp in [0.0, 100.0, 1000.0, 10_000.0] {
            let v = position_to_velocity(&g, sp, 0.0, 0.0);
            assert!(v > prev);
            prev = v;
        }
    }

    #[test]
    fn feed_forward_is_additive() {
        let g = gains();
        let base = position_to_velocity(&g, 1000.0, 0.0, 0.0);
        let with_ff = position_to_velocity(&g, 1000.0, 0.0, 3.5);
        assert!((with_ff - base - 3.5).abs() < 1e-12);
    }

    #[test]
    fn velocity_clamp_symmetric() {
        let g = gains();
        assert_eq!(clamp_velocity(&g, 50_000.0), 20_000.0);
        assert_eq!(clamp_velocity(&g, -50_000.0), -20_000.0);
        assert_eq!(clamp_velocity(&g, 10.0), 10.0);
    }

    #[test]
    fn first_tick_has_no_integrator_contribution() {
        let g = gains();
        let mut integrator = 0.0;
        let current = velocity_to_current(&mut integrator, &g, 10.0, 0.0, 0.0, DT);
        // current = vel_gain × 10 = 0.005, integrator only advances after.
        assert!((current - 0.005).abs() < 1e-12);
        assert!(integrator > 0.0);
    }

    #[test]
    fn integrator_advances_per_tick() {
        let g = gains();
        let mut integrator = 0.0;
        for _ in 0..100 {
            velocity_to_current(&mut integrator, &g, 10.0, 0.0, 0.0, DT);
        }
        // 100 ticks of constant error 10: 1e-3 × 10 × dt × 100
        let expected = 1e-3 * 10.0 * DT * 100.0;
        assert!((integrator - expected).abs() < 1e-12);
    }

    #[test]
    fn current_feed_forward_applied_once_per_call() {
        let g = gains();
        let mut integrator = 0.0;
        let with_ff = velocity_to_current(&mut integrator, &g, 0.0, 0.0, 2.0, DT);
        assert!((with_ff - 2.0).abs() < 1e-12);
        let without = velocity_to_current(&mut integrator, &g, 0.0, 0.0, 0.0, DT);
        assert!((without).abs() < 1e-12);
    }
}
