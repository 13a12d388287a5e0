//! Anticogging calibration state machine and compensation lookup.
//!
//! Sweep: Idle → Calibrating → Done (back to Idle with a usable map).
//! While calibrating, the controller drives its own internal position
//! target — one fixed increment per map sample across one mechanical
//! revolution, starting from the position where the sweep began — and
//! records the steady-state compensation current at each settled
//! position.

use tracing::{info, trace, warn};

use helix_common::consts::{DEFAULT_CALIB_POS_THRESHOLD, DEFAULT_CALIB_VEL_THRESHOLD};

/// Calibration state plus the per-position compensation map.
///
/// The map is allocated once at calibration start and never resized.
/// Aborting a sweep keeps already-recorded entries and leaves the rest at
/// their prior value — never a torn or NaN state.
#[derive(Debug, Clone)]
pub struct AnticoggingState {
    /// Current calibration position index.
    index: usize,
    /// Sweep anchor [counts]: the position estimate observed on the first
    /// calibration tick. Targets and the compensation lookup are both
    /// relative to it; it persists until the next sweep starts.
    anchor: Option<f64>,
    /// Per-position compensation currents [A], one mechanical revolution.
    cogging_map: Option<Box<[f64]>>,
    /// Apply the map as a correction during normal operation.
    pub use_anticogging: bool,
    /// True while a calibration sweep is in progress.
    calib_anticogging: bool,
    /// Settling window on position error [counts].
    pub calib_pos_threshold: f64,
    /// Settling window on velocity [counts/s].
    pub calib_vel_threshold: f64,
}

impl Default for AnticoggingState {
    fn default() -> Self {
        Self {
            index: 0,
            anchor: None,
            cogging_map: None,
            use_anticogging: false,
            calib_anticogging: false,
            calib_pos_threshold: DEFAULT_CALIB_POS_THRESHOLD,
            calib_vel_threshold: DEFAULT_CALIB_VEL_THRESHOLD,
        }
    }
}

impl AnticoggingState {
    /// True while a calibration sweep is in progress.
    #[inline]
    pub fn is_calibrating(&self) -> bool {
        self.calib_anticogging
    }

    /// True once a map has been allocated (calibrated or not).
    #[inline]
    pub fn has_map(&self) -> bool {
        self.cogging_map.is_some()
    }

    /// Current calibration index.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Read access to the compensation map.
    #[inline]
    pub fn map(&self) -> Option<&[f64]> {
        self.cogging_map.as_deref()
    }

    /// Begin a calibration sweep.
    ///
    /// Allocates the map on first use (`map_size` samples, zero-filled) —
    /// the one non-real-time-safe operation in this module. A repeated
    /// start reuses the existing allocation and restarts from index 0.
    pub fn start(&mut self, map_size: usize) {
        if self.cogging_map.is_none() {
            self.cogging_map = Some(vec![0.0; map_size].into_boxed_slice());
        }
        self.index = 0;
        self.anchor = None;
        self.calib_anticogging = true;
        info!(map_size, "anticogging calibration started");
    }

    /// Abort a sweep in progress.
    ///
    /// Recorded entries stay intact; uncalibrated entries keep their prior
    /// value. The map is not marked usable.
    pub fn abort(&mut self) {
        if self.calib_anticogging {
            self.calib_anticogging = false;
            warn!(index = self.index, "anticogging calibration aborted");
        }
    }

    /// Internal position target for the current index [counts].
    ///
    /// Targets run from the sweep anchor across one *mechanical*
    /// revolution (`counts_per_rev` = electrical cpr × gear ratio) in
    /// fixed increments.
    pub fn target_position(&self, counts_per_rev: f64) -> f64 {
        let anchor = self.anchor.unwrap_or(0.0);
        match &self.cogging_map {
            Some(map) if !map.is_empty() => {
                anchor + self.index as f64 / map.len() as f64 * counts_per_rev
            }
            _ => anchor,
        }
    }

    /// Set the calibration index directly (remote-property write).
    ///
    /// Accepted only when in range: inside the allocated map, or zero
    /// when no map exists yet.
    pub fn set_index(&mut self, index: usize) -> bool {
        let in_range = match &self.cogging_map {
            Some(map) => index < map.len(),
            None => index == 0,
        };
        if in_range {
            self.index = index;
        }
        in_range
    }

    /// Advance the sweep by one tick.
    ///
    /// The first tick anchors the sweep at `pos_estimate`; all targets
    /// then run from that anchor.
    /// When the axis has settled on the current target (position error and
    /// velocity both inside their thresholds), records `steady_current`
    /// at the current index and moves to the next one. Returns `true`
    /// exactly once, when the final index completes and the map becomes
    /// usable. Thresholds that are never satisfied stall the sweep at the
    /// current index indefinitely — there is no internal timeout.
    pub fn step(
        &mut self,
        pos_estimate: f64,
        vel_estimate: f64,
        steady_current: f64,
        counts_per_rev: f64,
    ) -> bool {
        if !self.calib_anticogging {
            return false;
        }
        if self.anchor.is_none() {
            self.anchor = Some(pos_estimate);
        }
        let target = self.target_position(counts_per_rev);
        let Some(map) = self.cogging_map.as_deref_mut() else {
            return false;
        };

        let settled = (pos_estimate - target).abs() < self.calib_pos_threshold
            && vel_estimate.abs() < self.calib_vel_threshold;
        if settled {
            if let Some(slot) = map.get_mut(self.index) {
                *slot = steady_current;
                trace!(index = self.index, current = steady_current, "cogging sample recorded");
            }
            self.index += 1;
        }

        if self.index >= map.len() {
            self.index = 0;
            self.use_anticogging = true;
            self.calib_anticogging = false;
            info!("anticogging calibration complete");
            return true;
        }
        false
    }

    /// Position-indexed compensation current for normal operation [A].
    ///
    /// Wraps the offset from the sweep anchor into one mechanical
    /// revolution and looks up the nearest map sample. Zero when disabled
    /// or no map is allocated.
    pub fn compensation(&self, pos_estimate: f64, counts_per_rev: f64) -> f64 {
        if !self.use_anticogging {
            return 0.0;
        }
        let Some(map) = self.cogging_map.as_deref() else {
            return 0.0;
        };
        if map.is_empty() || counts_per_rev <= 0.0 {
            return 0.0;
        }
        let wrapped = (pos_estimate - self.anchor.unwrap_or(0.0)).rem_euclid(counts_per_rev);
        let idx = ((wrapped / counts_per_rev) * map.len() as f64) as usize;
        map.get(idx.min(map.len() - 1)).copied().unwrap_or(0.0)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
