//! Numerical guard for the explicit integrator.
//!
//! Forward Euler with a coarse step can overshoot. The guard flags ticks whose
//! temperature change is implausible; it never alters the state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instability {
    /// Temperature became NaN or infinite. The run stops.
    NonFinite,
    /// Single-tick change above the configured ceiling.
    StepTooLarge,
    /// Consecutive large swings in opposite directions.
    Oscillation,
}

/// Upper estimate of the per-tick temperature change:
/// `dt · (peak heat + cooling scale) / C`.
pub fn truncation_bound_c(dt_s: f64, peak_heat_w: f64, cooling_scale_w: f64, capacitance: f64) -> f64 {
    dt_s * (peak_heat_w + cooling_scale_w) / capacitance
}

#[derive(Debug, Clone)]
pub struct NumericalGuard {
    max_step_delta_c: f64,
    oscillation_c: f64,
    last_delta_c: Option<f64>,
}

impl NumericalGuard {
    pub fn new(max_step_delta_c: f64, truncation_bound_c: f64) -> Self {
        Self {
            max_step_delta_c,
            oscillation_c: truncation_bound_c / 2.0,
            last_delta_c: None,
        }
    }

    /// Inspect one tick's transition from `before_c` to `after_c`.
    pub fn check(&mut self, before_c: f64, after_c: f64) -> Option<(Instability, f64)> {
        if !after_c.is_finite() {
            return Some((Instability::NonFinite, after_c - before_c));
        }
        let delta = after_c - before_c;
        let last = self.last_delta_c.replace(delta);
        if delta.abs() > self.max_step_delta_c {
            return Some((Instability::StepTooLarge, delta));
        }
        if let Some(last) = last
            && last.signum() != delta.signum()
            && last.abs() > self.oscillation_c
            && delta.abs() > self.oscillation_c
        {
            return Some((Instability::Oscillation, delta));
        }
        None
    }
}
