//! Variable-speed fan.
//!
//! The fan adds no cooling of its own. It multiplies the sum of every other
//! mechanism: `total = (passive + gas + afterglow + tec) · multiplier`.

use crate::resources::ResourcePool;
use cc_controls::DutyRamp;
use cc_core::power_over_wh;
use cc_project::FanDef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FanState {
    pub duty_pct: f64,
    pub multiplier: f64,
    /// Fraction of the current ramp completed, 1.0 when at target.
    pub ramp_progress: f64,
}

#[derive(Debug, Clone)]
pub struct Fan {
    def: FanDef,
    ramp: DutyRamp,
    state: FanState,
    ramp_from_pct: f64,
    ramp_target_pct: f64,
    boost_remaining_s: f64,
}

impl Fan {
    pub fn new(def: FanDef) -> Self {
        let ramp = DutyRamp {
            ramp_up_s: def.ramp_up_s,
            ramp_down_s: def.ramp_down_s,
        };
        Self {
            def,
            ramp,
            state: FanState {
                duty_pct: 0.0,
                multiplier: 1.0,
                ramp_progress: 1.0,
            },
            ramp_from_pct: 0.0,
            ramp_target_pct: 0.0,
            boost_remaining_s: 0.0,
        }
    }

    pub fn state(&self) -> &FanState {
        &self.state
    }

    pub fn boost_remaining_s(&self) -> f64 {
        self.boost_remaining_s
    }

    /// Open the post-purge boost window.
    pub fn start_boost(&mut self) {
        self.boost_remaining_s = self.def.boost_window_s;
    }

    /// Multiplier at `duty_pct` with `boost_remaining_s` left in the window.
    pub fn multiplier_at(&self, duty_pct: f64, boost_remaining_s: f64) -> f64 {
        if duty_pct <= 0.0 {
            return 1.0;
        }
        let d = duty_pct / 100.0;
        let mut m = (1.0 + (self.def.multiplier_base - 1.0) * d) * (1.0 + self.def.speed_gain * d);
        if boost_remaining_s > 0.0 && self.def.boost_window_s > 0.0 {
            m *= 1.0 + self.def.purge_boost * boost_remaining_s / self.def.boost_window_s;
        }
        m.clamp(self.def.multiplier_min, self.def.multiplier_max)
    }

    fn track_ramp(&mut self, from_pct: f64, target_pct: f64) {
        if target_pct != self.ramp_target_pct {
            self.ramp_from_pct = from_pct;
            self.ramp_target_pct = target_pct;
        }
        let span = self.ramp_target_pct - self.ramp_from_pct;
        self.state.ramp_progress = if span.abs() <= f64::EPSILON {
            1.0
        } else {
            ((self.state.duty_pct - self.ramp_from_pct) / span).clamp(0.0, 1.0)
        };
    }

    /// Advance the fan one tick toward `mode_duty_pct` and return the
    /// multiplier for this tick.
    pub fn step(
        &mut self,
        dt: f64,
        mode_duty_pct: f64,
        enabled: bool,
        pool: &mut ResourcePool,
    ) -> f64 {
        let target = if !enabled {
            0.0
        } else if self.boost_remaining_s > 0.0 {
            mode_duty_pct.max(self.def.purge_duty_pct)
        } else {
            mode_duty_pct
        };
        let from_pct = self.state.duty_pct;
        self.state.duty_pct = self.ramp.step(from_pct, target, dt);
        self.track_ramp(from_pct, target);

        let mut multiplier = 1.0;
        if enabled && self.state.duty_pct > 0.0 && pool.battery_has_charge() {
            let need_wh = power_over_wh(self.def.draw_w * self.state.duty_pct / 100.0, dt);
            let fraction = if need_wh > 0.0 {
                pool.draw_battery(need_wh) / need_wh
            } else {
                1.0
            };
            let full = self.multiplier_at(self.state.duty_pct, self.boost_remaining_s);
            multiplier = 1.0 + (full - 1.0) * fraction;
        }

        self.boost_remaining_s = (self.boost_remaining_s - dt).max(0.0);
        self.state.multiplier = multiplier;
        multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_project::presets;

    fn fan() -> Fan {
        Fan::new(presets::tactical().fan)
    }

    fn pool(battery_wh: f64) -> ResourcePool {
        ResourcePool::new(&[2900.0], battery_wh, battery_wh).unwrap()
    }

    #[test]
    fn zero_duty_is_neutral() {
        let f = fan();
        assert_eq!(f.multiplier_at(0.0, 180.0), 1.0);
    }

    #[test]
    fn full_duty_multiplier() {
        let f = fan();
        // (1 + 0.3) * (1 + 0.7)
        assert!((f.multiplier_at(100.0, 0.0) - 2.21).abs() < 1e-12);
        // boost pushes it into the cap
        assert_eq!(f.multiplier_at(100.0, 180.0), 2.5);
    }

    #[test]
    fn duty_ramps_toward_mode_target() {
        let mut f = fan();
        let mut p = pool(60.0);
        f.step(5.0, 100.0, true, &mut p);
        assert!((f.state().duty_pct - 10.0).abs() < 1e-12);
        assert!((f.state().ramp_progress - 0.1).abs() < 1e-12);
        for _ in 0..20 {
            f.step(5.0, 100.0, true, &mut p);
        }
        assert_eq!(f.state().duty_pct, 100.0);
        assert_eq!(f.state().ramp_progress, 1.0);
    }

    #[test]
    fn purge_duty_floor_applies_during_boost() {
        let mut def = presets::tactical().fan;
        def.purge_duty_pct = 80.0;
        def.ramp_up_s = 0.0;
        let mut f = Fan::new(def);
        let mut p = pool(60.0);
        f.start_boost();
        f.step(5.0, 30.0, true, &mut p);
        assert_eq!(f.state().duty_pct, 80.0);
        assert!((f.boost_remaining_s() - 175.0).abs() < 1e-12);
    }

    #[test]
    fn no_battery_no_boost() {
        let mut f = fan();
        let mut p = pool(0.0);
        for _ in 0..20 {
            assert_eq!(f.step(5.0, 100.0, true, &mut p), 1.0);
        }
    }

    #[test]
    fn disabled_fan_spins_down() {
        let mut f = fan();
        let mut p = pool(60.0);
        for _ in 0..10 {
            f.step(5.0, 100.0, true, &mut p);
        }
        assert_eq!(f.step(5.0, 100.0, false, &mut p), 1.0);
        assert!(f.state().duty_pct < 100.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn multiplier_never_below_one(duty in 0.0f64..=100.0, boost in 0.0f64..=180.0) {
                let f = fan();
                let m = f.multiplier_at(duty, boost);
                prop_assert!(m >= 1.0);
                prop_assert!(m <= 2.5);
            }
        }
    }
}
