//! Engine configuration.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default fixed-point multiplier applied to UV coordinates.
pub const DEFAULT_UNIT_SCALE: f64 = 10_000_000.0;

/// Engine configuration shared by clustering and the nesting scheduler.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Fixed-point multiplier for normalized (UV) input.
    pub unit_scale: f64,

    /// Margin, in fixed-point units, added to the summed extents of a nest canvas.
    pub canvas_margin: i64,

    /// Number of NFP chunks, each followed by a progress report and a cancel check.
    pub update_breaks: usize,

    /// Placements between cancellation checks.
    pub cancel_check_interval: usize,

    /// Maximum relative gap between a polygon and its bounding box for it to
    /// count as almost rectangular.
    pub almost_rectangle_tolerance: f64,

    /// Number of worker threads (0 = auto).
    pub threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            unit_scale: DEFAULT_UNIT_SCALE,
            canvas_margin: 1000,
            update_breaks: 10,
            cancel_check_interval: 10,
            almost_rectangle_tolerance: 0.05,
            threads: 0,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the UV fixed-point multiplier.
    pub fn with_unit_scale(mut self, unit_scale: f64) -> Self {
        self.unit_scale = unit_scale;
        self
    }

    /// Sets the nest canvas margin.
    pub fn with_canvas_margin(mut self, margin: i64) -> Self {
        self.canvas_margin = margin;
        self
    }

    /// Sets the number of NFP progress chunks.
    pub fn with_update_breaks(mut self, breaks: usize) -> Self {
        self.update_breaks = breaks;
        self
    }

    /// Sets how many placements run between cancellation checks.
    pub fn with_cancel_check_interval(mut self, interval: usize) -> Self {
        self.cancel_check_interval = interval;
        self
    }

    /// Sets the almost-rectangle tolerance.
    pub fn with_almost_rectangle_tolerance(mut self, tolerance: f64) -> Self {
        self.almost_rectangle_tolerance = tolerance;
        self
    }

    /// Sets the worker thread count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Checks that every field is in range.
    pub fn validate(&self) -> Result<()> {
        if !(self.unit_scale.is_finite() && self.unit_scale > 0.0) {
            return Err(Error::ConfigError(format!(
                "unit_scale must be positive, got {}",
                self.unit_scale
            )));
        }
        if self.canvas_margin < 0 {
            return Err(Error::ConfigError(format!(
                "canvas_margin must be non-negative, got {}",
                self.canvas_margin
            )));
        }
        if self.update_breaks == 0 {
            return Err(Error::ConfigError("update_breaks must be at least 1".into()));
        }
        if self.cancel_check_interval == 0 {
            return Err(Error::ConfigError(
                "cancel_check_interval must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.almost_rectangle_tolerance) {
            return Err(Error::ConfigError(format!(
                "almost_rectangle_tolerance must lie in [0, 1], got {}",
                self.almost_rectangle_tolerance
            )));
        }
        Ok(())
    }
}
