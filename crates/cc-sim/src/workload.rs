//! Exogenous heat input.

use cc_project::WorkloadDef;
use std::f64::consts::PI;

/// Deterministic heat source: a base load with a sinusoidal swing, pinned to
/// a stress level inside configured windows.
#[derive(Debug, Clone)]
pub struct Workload {
    def: WorkloadDef,
}

impl Workload {
    pub fn new(def: WorkloadDef) -> Self {
        Self { def }
    }

    pub fn base_w(&self) -> f64 {
        self.def.base_fraction * self.def.rated_w
    }

    pub fn variation_w(&self, t: f64) -> f64 {
        (2.0 * PI * t / self.def.variation_period_s).sin()
            * self.def.variation_fraction
            * self.def.rated_w
    }

    /// Stress level (W) if `t` falls strictly inside a window.
    pub fn stress_level_w(&self, t: f64) -> Option<f64> {
        self.def
            .stress_windows
            .iter()
            .find(|w| w.start_s < t && t < w.end_s)
            .map(|w| w.level_fraction * self.def.rated_w)
    }

    /// Extra output a stress window adds on top of base and variation.
    pub fn stress_bonus_w(&self, t: f64) -> f64 {
        self.stress_level_w(t)
            .map_or(0.0, |level| level - (self.base_w() + self.variation_w(t)))
    }

    pub fn heat_input_w(&self, t: f64) -> f64 {
        match self.stress_level_w(t) {
            Some(level) => level,
            None => self.base_w() + self.variation_w(t),
        }
    }

    /// Upper bound on `heat_input_w` over all time.
    pub fn peak_w(&self) -> f64 {
        let swing = self.base_w() + self.def.variation_fraction * self.def.rated_w;
        self.def
            .stress_windows
            .iter()
            .map(|w| w.level_fraction * self.def.rated_w)
            .fold(swing, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_project::StressWindowDef;

    fn workload() -> Workload {
        Workload::new(WorkloadDef {
            rated_w: 18.5,
            base_fraction: 0.85,
            variation_fraction: 0.15,
            variation_period_s: 600.0,
            stress_windows: vec![StressWindowDef {
                start_s: 900.0,
                end_s: 1100.0,
                level_fraction: 1.1,
            }],
        })
    }

    #[test]
    fn base_plus_variation() {
        let w = workload();
        assert!((w.heat_input_w(0.0) - 15.725).abs() < 1e-12);
        // quarter period: full positive swing
        assert!((w.heat_input_w(150.0) - (15.725 + 2.775)).abs() < 1e-9);
    }

    #[test]
    fn stress_window_is_open_interval() {
        let w = workload();
        assert!((w.heat_input_w(1000.0) - 20.35).abs() < 1e-12);
        assert!(w.stress_level_w(900.0).is_none());
        assert!(w.stress_level_w(1100.0).is_none());
        assert_eq!(w.stress_bonus_w(500.0), 0.0);
    }

    #[test]
    fn components_sum_to_heat_input() {
        let w = workload();
        for t in [0.0, 450.0, 905.0, 1095.0, 2000.0] {
            let sum = w.base_w() + w.variation_w(t) + w.stress_bonus_w(t);
            assert!((sum - w.heat_input_w(t)).abs() < 1e-9);
        }
    }

    #[test]
    fn replayable() {
        let a = workload();
        let b = workload();
        for k in 0..100 {
            let t = k as f64 * 37.0;
            assert_eq!(a.heat_input_w(t).to_bits(), b.heat_input_w(t).to_bits());
        }
    }

    #[test]
    fn peak_bounds_output() {
        let w = workload();
        let peak = w.peak_w();
        for k in 0..720 {
            assert!(w.heat_input_w(k as f64 * 5.0) <= peak + 1e-12);
        }
    }
}
