//! Thermoelectric cooler with derating, runtime limit and hot-side model.

use crate::resources::ResourcePool;
use cc_core::power_over_wh;
use cc_project::TecDef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TecState {
    pub enabled: bool,
    pub continuous_runtime_s: f64,
    pub hot_side_temp_c: f64,
    /// Earliest time the module may be re-enabled after a forced shutdown.
    pub shutdown_until_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TecShutdown {
    RuntimeLimit,
    HotSideLimit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TecOutput {
    pub cooling_w: f64,
    pub efficiency: f64,
    pub shutdown: Option<TecShutdown>,
}

#[derive(Debug, Clone)]
pub struct Tec {
    def: TecDef,
    state: TecState,
}

impl Tec {
    pub fn new(def: TecDef, initial_c: f64) -> Self {
        Self {
            def,
            state: TecState {
                enabled: false,
                continuous_runtime_s: 0.0,
                hot_side_temp_c: initial_c,
                shutdown_until_s: f64::NEG_INFINITY,
            },
        }
    }

    pub fn state(&self) -> &TecState {
        &self.state
    }

    /// Coefficient of performance at the current hot-side temperature.
    ///
    /// Falls off quadratically with the hot-to-die differential and is
    /// halved (by `derate_factor`) once the hot side runs hot.
    pub fn efficiency(&self, die_c: f64) -> f64 {
        let d = &self.def;
        let diff = self.state.hot_side_temp_c - die_c;
        if diff <= 0.0 {
            return d.base_efficiency;
        }
        let mut eff = d.base_efficiency * (1.0 - (diff / d.derate_span_c).powi(2));
        if self.state.hot_side_temp_c > d.derate_hot_c {
            eff *= d.derate_factor;
        }
        eff.clamp(d.min_efficiency, d.base_efficiency)
    }

    /// Cooling available at `efficiency`, capped at the module rating.
    pub fn derated_cooling_w(&self, efficiency: f64) -> f64 {
        self.def.max_cooling_w.min(self.def.max_cooling_w * efficiency)
    }

    fn force_off(&mut self, t: f64) -> Option<TecShutdown> {
        if !self.state.enabled {
            return None;
        }
        let reason = if self.state.continuous_runtime_s >= self.def.max_runtime_s {
            TecShutdown::RuntimeLimit
        } else if self.state.hot_side_temp_c > self.def.shutdown_hot_c {
            TecShutdown::HotSideLimit
        } else {
            return None;
        };
        self.state.enabled = false;
        self.state.continuous_runtime_s = 0.0;
        self.state.shutdown_until_s = t + self.def.cooldown_s;
        Some(reason)
    }

    /// Battery reserve band: switching on needs more than `reserve_on_wh`,
    /// a running module keeps going down to `reserve_off_wh`.
    fn reserve_allows(&self, battery_wh: f64) -> bool {
        if self.state.enabled {
            battery_wh >= self.def.reserve_off_wh
        } else {
            battery_wh > self.def.reserve_on_wh
        }
    }

    /// Advance the module over `[t, t + dt)`.
    pub fn step(
        &mut self,
        t: f64,
        dt: f64,
        die_c: f64,
        requested: bool,
        pool: &mut ResourcePool,
    ) -> TecOutput {
        let shutdown = self.force_off(t);

        let allowed = t >= self.state.shutdown_until_s
            && self.state.hot_side_temp_c < self.def.resume_hot_c
            && pool.battery_has_charge()
            && self.reserve_allows(pool.battery_remaining_wh());
        self.state.enabled = requested && allowed;
        if !self.state.enabled {
            self.state.continuous_runtime_s = 0.0;
            self.state.hot_side_temp_c = die_c.max(
                self.state.hot_side_temp_c - self.def.recovery_c_per_s * dt,
            );
            return TecOutput {
                shutdown,
                ..TecOutput::default()
            };
        }

        let efficiency = self.efficiency(die_c);
        let need_wh = power_over_wh(self.def.draw_w, dt);
        let fraction = if need_wh > 0.0 {
            pool.draw_battery(need_wh) / need_wh
        } else {
            1.0
        };
        let cooling_w = self.derated_cooling_w(efficiency) * fraction;
        let waste_j = self.def.draw_w * (1.0 - efficiency) * dt * fraction;
        self.state.hot_side_temp_c +=
            (waste_j - self.def.reject_w * dt) / self.def.hot_side_capacitance_j_per_c;
        self.state.continuous_runtime_s += dt;

        TecOutput {
            cooling_w,
            efficiency,
            shutdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_project::presets;

    fn tec() -> Tec {
        Tec::new(presets::tactical().tec, 25.0)
    }

    fn pool(battery_wh: f64) -> ResourcePool {
        ResourcePool::new(&[2900.0], battery_wh, battery_wh).unwrap()
    }

    #[test]
    fn full_efficiency_when_hot_side_not_above_die() {
        let t = tec();
        assert_eq!(t.efficiency(30.0), 0.6);
        assert_eq!(t.derated_cooling_w(0.6), 9.0);
    }

    #[test]
    fn efficiency_derates_with_differential() {
        let mut t = tec();
        t.state.hot_side_temp_c = 60.0;
        // diff 35 of span 70: 0.6 * (1 - 0.25)
        assert!((t.efficiency(25.0) - 0.45).abs() < 1e-12);
        t.state.hot_side_temp_c = 88.0;
        // hot side above 85 halves, clamped at the floor
        assert!((t.efficiency(25.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn runs_when_requested_and_draws_battery() {
        let mut t = tec();
        let mut p = pool(60.0);
        let out = t.step(0.0, 5.0, 70.0, true, &mut p);
        assert!(t.state().enabled);
        assert_eq!(out.cooling_w, 9.0);
        assert!((p.battery_remaining_wh() - (60.0 - 150.0 / 3600.0)).abs() < 1e-12);
        assert_eq!(t.state().continuous_runtime_s, 5.0);
    }

    #[test]
    fn runtime_limit_forces_cooldown() {
        let mut t = tec();
        let mut p = pool(60.0);
        let mut time = 0.0;
        for _ in 0..24 {
            t.step(time, 5.0, 70.0, true, &mut p);
            time += 5.0;
        }
        assert_eq!(t.state().continuous_runtime_s, 120.0);

        let out = t.step(time, 5.0, 70.0, true, &mut p);
        assert_eq!(out.shutdown, Some(TecShutdown::RuntimeLimit));
        assert_eq!(out.cooling_w, 0.0);
        assert!(!t.state().enabled);
        assert_eq!(t.state().continuous_runtime_s, 0.0);

        // cooldown elapsed on the next tick
        let out = t.step(time + 5.0, 5.0, 70.0, true, &mut p);
        assert!(out.cooling_w > 0.0);
    }

    #[test]
    fn runtime_resets_when_released() {
        let mut t = tec();
        let mut p = pool(60.0);
        t.step(0.0, 5.0, 70.0, true, &mut p);
        t.step(5.0, 5.0, 70.0, false, &mut p);
        assert_eq!(t.state().continuous_runtime_s, 0.0);
        assert!(!t.state().enabled);
    }

    #[test]
    fn empty_battery_contributes_nothing() {
        let mut t = tec();
        let mut p = pool(0.0);
        let out = t.step(0.0, 5.0, 70.0, true, &mut p);
        assert_eq!(out.cooling_w, 0.0);
        assert!(!t.state().enabled);
    }

    #[test]
    fn reserve_blocks_switch_on_below_threshold() {
        let mut t = tec();
        let mut p = pool(5.0);
        let out = t.step(0.0, 5.0, 70.0, true, &mut p);
        assert_eq!(out.cooling_w, 0.0);
        assert!(!t.state().enabled);
        assert_eq!(p.battery_remaining_wh(), 5.0);
    }

    #[test]
    fn running_module_holds_down_to_off_reserve() {
        let mut t = tec();
        let step_wh = power_over_wh(30.0, 5.0);
        let mut p = pool(5.0 + step_wh);
        t.step(0.0, 5.0, 70.0, true, &mut p);
        assert!(t.state().enabled);
        // now at 5 Wh: too little to start, enough to keep running
        t.step(5.0, 5.0, 70.0, true, &mut p);
        assert!(t.state().enabled);

        let mut p = pool(3.0 - 1e-9);
        t.step(10.0, 5.0, 70.0, true, &mut p);
        assert!(!t.state().enabled);
    }

    #[test]
    fn partial_battery_scales_cooling() {
        let mut def = presets::tactical().tec;
        def.reserve_on_wh = 0.0;
        def.reserve_off_wh = 0.0;
        let mut t = Tec::new(def, 25.0);
        let half = power_over_wh(30.0, 5.0) / 2.0;
        let mut p = pool(half);
        let out = t.step(0.0, 5.0, 70.0, true, &mut p);
        assert!((out.cooling_w - 4.5).abs() < 1e-9);
        assert!(!p.battery_has_charge());
    }

    #[test]
    fn hot_side_relaxes_while_off() {
        let mut t = tec();
        let mut p = pool(60.0);
        t.state.hot_side_temp_c = 80.0;
        t.step(0.0, 5.0, 50.0, false, &mut p);
        assert!((t.state().hot_side_temp_c - 79.5).abs() < 1e-12);
        t.state.hot_side_temp_c = 50.2;
        t.step(5.0, 5.0, 50.0, false, &mut p);
        assert_eq!(t.state().hot_side_temp_c, 50.0);
    }
}
