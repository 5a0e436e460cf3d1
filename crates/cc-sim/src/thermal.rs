//! Lumped thermal capacitance.

use crate::error::SimResult;
use cc_core::{ensure_finite, ensure_positive};

/// Single thermal node: one temperature, one heat capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalState {
    temperature_c: f64,
    capacitance_j_per_c: f64,
}

impl ThermalState {
    pub fn new(initial_c: f64, capacitance_j_per_c: f64) -> SimResult<Self> {
        Ok(Self {
            temperature_c: ensure_finite(initial_c, "initial temperature")?,
            capacitance_j_per_c: ensure_positive(capacitance_j_per_c, "thermal capacitance")?,
        })
    }

    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    pub fn capacitance_j_per_c(&self) -> f64 {
        self.capacitance_j_per_c
    }

    /// Forward Euler step: `ΔT = (heat_in − cooling_out)·dt / C`.
    ///
    /// Not clamped; a run that overheats keeps climbing.
    pub fn integrate(&mut self, heat_in_w: f64, cooling_out_w: f64, dt_s: f64) -> f64 {
        self.temperature_c += (heat_in_w - cooling_out_w) * dt_s / self.capacitance_j_per_c;
        self.temperature_c
    }
}
