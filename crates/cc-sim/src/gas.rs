//! Gas cooling: duty-cycled microbursts, emergency purges and the afterglow
//! of the chilled canister body.
//!
//! Continuous microbursts run on a fixed schedule starting at t = 0. Each
//! scheduled burst lasts the current mode's `burst_s` and the next one is due
//! one `interval_s` later. Bursts can straddle tick boundaries; the
//! unfinished part is carried in a [`BurstTimer`]. Tick-aligned bursts fire
//! only on ticks that start on the interval grid and never carry.

use crate::resources::ResourcePool;
use cc_controls::Actuation;
use cc_core::{Tolerances, nearly_equal};
use cc_project::{BurstSchedule, GasDef};
use serde::{Deserialize, Serialize};

/// Burst remainders shorter than this are treated as finished.
const MIN_CARRY_S: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurstTimer {
    pub remaining_s: f64,
    pub power_w: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AfterglowTimer {
    pub remaining_s: f64,
    pub power_w: f64,
}

/// Gas contributions for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GasOutput {
    pub purge_j: f64,
    pub microburst_j: f64,
    pub afterglow_w: f64,
    pub purged: bool,
}

#[derive(Debug, Clone)]
pub struct GasSystem {
    burst_rate_w: f64,
    schedule: BurstSchedule,
    purge_efficiency: f64,
    afterglow_w: f64,
    afterglow_s: f64,
    microburst_afterglow_s: f64,
    next_burst_at_s: f64,
    burst: Option<BurstTimer>,
    afterglow: Option<AfterglowTimer>,
    purge_count: usize,
}

impl GasSystem {
    pub fn new(def: &GasDef) -> Self {
        Self {
            burst_rate_w: def.burst_rate_w,
            schedule: def.burst_schedule,
            purge_efficiency: def.purge_efficiency,
            afterglow_w: def.afterglow_w,
            afterglow_s: def.afterglow_s,
            microburst_afterglow_s: def.microburst_afterglow_s,
            next_burst_at_s: 0.0,
            burst: None,
            afterglow: None,
            purge_count: 0,
        }
    }

    pub fn purge_count(&self) -> usize {
        self.purge_count
    }

    pub fn afterglow(&self) -> Option<&AfterglowTimer> {
        self.afterglow.as_ref()
    }

    pub fn burst(&self) -> Option<&BurstTimer> {
        self.burst.as_ref()
    }

    /// Gas and afterglow contributions over `[t, t + dt)`.
    ///
    /// With `enabled` false no gas is released and the burst schedule is
    /// pushed past this tick; an afterglow already running still decays.
    pub fn step(
        &mut self,
        t: f64,
        dt: f64,
        actuation: &Actuation,
        purge_requested: bool,
        enabled: bool,
        pool: &mut ResourcePool,
    ) -> GasOutput {
        let mut out = GasOutput::default();
        if enabled {
            if purge_requested {
                out.purge_j = self.purge(pool);
                out.purged = out.purge_j > 0.0;
            }
            out.microburst_j = self.microburst(t, dt, actuation, pool);
        } else {
            self.burst = None;
            self.next_burst_at_s = self.next_burst_at_s.max(t + dt);
        }
        out.afterglow_w = self.afterglow_power(dt);
        out
    }

    /// Release a lump sized from the active canister, spanning a switchover
    /// if needed.
    fn purge(&mut self, pool: &mut ResourcePool) -> f64 {
        let Some(active) = pool.active_canister() else {
            return 0.0;
        };
        let lump = active.capacity_j * self.purge_efficiency;
        let released = pool.draw_gas_spanning(lump);
        if released > 0.0 {
            self.purge_count += 1;
            self.restart_afterglow(self.afterglow_s);
        }
        released
    }

    fn microburst(
        &mut self,
        t: f64,
        dt: f64,
        actuation: &Actuation,
        pool: &mut ResourcePool,
    ) -> f64 {
        let open_s = match self.schedule {
            BurstSchedule::Continuous => self.continuous_open_s(t, dt, actuation),
            BurstSchedule::TickAligned => aligned_open_s(t, dt, actuation),
        };
        if open_s <= 0.0 {
            return 0.0;
        }
        let released = pool.draw_gas_spanning(self.burst_rate_w * open_s);
        if released > 0.0 && self.burst.is_none() && self.microburst_afterglow_s > 0.0 {
            self.restart_afterglow(self.microburst_afterglow_s);
        }
        released
    }

    /// Valve-open time inside `[t, t + dt)`. The bursts due in the tick are
    /// counted directly, so a tiny interval costs no more than a long one.
    fn continuous_open_s(&mut self, t: f64, dt: f64, actuation: &Actuation) -> f64 {
        let tick_end = t + dt;
        let mut open_s = 0.0;

        if let Some(carry) = self.burst.take() {
            let used = carry.remaining_s.min(dt);
            open_s += used;
            let left = carry.remaining_s - used;
            if left > MIN_CARRY_S {
                self.burst = Some(BurstTimer {
                    remaining_s: left,
                    ..carry
                });
            }
        }

        if self.next_burst_at_s >= tick_end {
            return open_s;
        }
        let interval = actuation.interval_s;
        let first = self.next_burst_at_s.max(t);
        let mut count = ((tick_end - first) / interval).ceil().max(1.0);
        let mut last_start = first + (count - 1.0) * interval;
        if last_start >= tick_end && count > 1.0 {
            count -= 1.0;
            last_start -= interval;
        }

        // Every burst but the last ends before the next one starts.
        let used = actuation.burst_s.min(tick_end - last_start);
        open_s += (count - 1.0) * actuation.burst_s + used;
        let left = actuation.burst_s - used;
        self.burst = (left > MIN_CARRY_S).then_some(BurstTimer {
            remaining_s: left,
            power_w: self.burst_rate_w,
        });
        self.next_burst_at_s = last_start + interval;
        open_s
    }

    fn restart_afterglow(&mut self, window_s: f64) {
        if window_s <= 0.0 {
            return;
        }
        let remaining_s = self
            .afterglow
            .map_or(window_s, |a| a.remaining_s.max(window_s));
        self.afterglow = Some(AfterglowTimer {
            remaining_s,
            power_w: self.afterglow_w,
        });
    }

    /// Afterglow power this tick, prorated on the final partial tick.
    fn afterglow_power(&mut self, dt: f64) -> f64 {
        let Some(timer) = self.afterglow.as_mut() else {
            return 0.0;
        };
        let power = timer.power_w * (timer.remaining_s.min(dt) / dt);
        timer.remaining_s -= dt;
        if timer.remaining_s <= 0.0 {
            self.afterglow = None;
        }
        power
    }
}

/// One burst, clipped to the tick, when `t` lies on the interval grid.
fn aligned_open_s(t: f64, dt: f64, actuation: &Actuation) -> f64 {
    let cycles = t / actuation.interval_s;
    if nearly_equal(cycles, cycles.round(), Tolerances::default()) {
        actuation.burst_s.min(dt)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_project::presets;

    fn gas(microburst_afterglow_s: f64) -> GasSystem {
        let mut def = presets::tactical().gas;
        def.burst_rate_w = 2.0;
        def.burst_schedule = BurstSchedule::Continuous;
        def.microburst_afterglow_s = microburst_afterglow_s;
        GasSystem::new(&def)
    }

    fn aligned() -> GasSystem {
        GasSystem::new(&presets::tactical().gas)
    }

    fn pool() -> ResourcePool {
        ResourcePool::new(&[2900.0, 2900.0], 60.0, 60.0).unwrap()
    }

    const IDLE: Actuation = Actuation::new(0.3, 8.0, 0.0, false);
    const EMERGENCY: Actuation = Actuation::new(1.0, 3.0, 100.0, true);

    #[test]
    fn idle_bursts_follow_schedule() {
        let mut g = gas(0.0);
        let mut p = pool();
        // bursts at 0, 8, 16 -> ticks [0,5) [5,10) [10,15) [15,20)
        let released: Vec<f64> = (0..4)
            .map(|k| {
                g.step(k as f64 * 5.0, 5.0, &IDLE, false, true, &mut p)
                    .microburst_j
            })
            .collect();
        assert!((released[0] - 0.6).abs() < 1e-12);
        assert!((released[1] - 0.6).abs() < 1e-12);
        assert_eq!(released[2], 0.0);
        assert!((released[3] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn two_bursts_can_share_a_tick() {
        let mut g = gas(0.0);
        let mut p = pool();
        // bursts at 0 and 3 both start in [0,5)
        let out = g.step(0.0, 5.0, &EMERGENCY, false, true, &mut p);
        assert!((out.microburst_j - 4.0).abs() < 1e-12);
    }

    #[test]
    fn straddling_burst_carries_over() {
        let mut g = gas(0.0);
        let mut p = pool();
        // dt = 0.2 s, burst 1.0 s: spans five ticks
        let mut total = 0.0;
        for k in 0..5 {
            total += g
                .step(k as f64 * 0.2, 0.2, &EMERGENCY, false, true, &mut p)
                .microburst_j;
        }
        assert!((total - 2.0).abs() < 1e-9);
        assert!(g.burst().is_none());
    }

    #[test]
    fn tiny_interval_counts_bursts_without_iterating() {
        let mut g = gas(0.0);
        let mut p = ResourcePool::new(&[1e12], 0.0, 0.0).unwrap();
        let dense = Actuation::new(1e-10, 1e-9, 0.0, false);
        // 5e9 bursts of 0.1 ns each: half a second of valve time
        let first = g.step(0.0, 5.0, &dense, false, true, &mut p);
        assert!((first.microburst_j - 1.0).abs() < 1e-6);
        let second = g.step(5.0, 5.0, &dense, false, true, &mut p);
        assert!((second.microburst_j - 1.0).abs() < 1e-6);
    }

    #[test]
    fn aligned_bursts_fire_only_on_grid_ticks() {
        let mut g = aligned();
        let mut p = pool();
        // interval 3 s against 5 s ticks: grid hits at 0 and 15
        let released: Vec<f64> = (0..4)
            .map(|k| {
                g.step(k as f64 * 5.0, 5.0, &EMERGENCY, false, true, &mut p)
                    .microburst_j
            })
            .collect();
        assert_eq!(released, vec![3.0, 0.0, 0.0, 3.0]);
        assert!(g.burst().is_none());
    }

    #[test]
    fn aligned_burst_is_clipped_to_one_tick() {
        let mut g = aligned();
        let mut p = pool();
        let first = g.step(0.0, 0.25, &EMERGENCY, false, true, &mut p);
        assert!((first.microburst_j - 0.75).abs() < 1e-12);
        let second = g.step(0.25, 0.25, &EMERGENCY, false, true, &mut p);
        assert_eq!(second.microburst_j, 0.0);
    }

    #[test]
    fn purge_draws_lump_and_starts_afterglow() {
        let mut g = gas(0.0);
        let mut p = pool();
        let out = g.step(0.0, 5.0, &IDLE, true, true, &mut p);
        assert!(out.purged);
        assert!((out.purge_j - 2465.0).abs() < 1e-9);
        assert_eq!(out.afterglow_w, 2.2);
        assert_eq!(g.purge_count(), 1);
    }

    #[test]
    fn purge_spans_into_next_canister() {
        let mut g = gas(0.0);
        let mut p = pool();
        g.step(0.0, 5.0, &IDLE, true, true, &mut p);
        let second = g.step(5.0, 5.0, &IDLE, true, true, &mut p);
        assert!((second.purge_j - 2465.0).abs() < 1e-9);
        assert_eq!(p.active_index(), 1);
    }

    #[test]
    fn afterglow_expires_after_window() {
        let mut g = gas(0.0);
        let mut p = pool();
        g.step(0.0, 5.0, &IDLE, true, true, &mut p);
        let mut live_ticks = 1;
        for k in 1..60 {
            if g.step(k as f64 * 5.0, 5.0, &IDLE, false, true, &mut p).afterglow_w > 0.0 {
                live_ticks += 1;
            }
        }
        assert_eq!(live_ticks, 36);
        assert!(g.afterglow().is_none());
    }

    #[test]
    fn microburst_end_restarts_afterglow_when_configured() {
        let mut g = gas(10.0);
        let mut p = pool();
        let out = g.step(0.0, 5.0, &IDLE, false, true, &mut p);
        assert!(out.afterglow_w > 0.0);

        let mut quiet = gas(0.0);
        let mut p = pool();
        let out = quiet.step(0.0, 5.0, &IDLE, false, true, &mut p);
        assert_eq!(out.afterglow_w, 0.0);
    }

    #[test]
    fn disabled_gas_releases_nothing_and_does_not_catch_up() {
        let mut g = gas(0.0);
        let mut p = pool();
        for k in 0..10 {
            let out = g.step(k as f64 * 5.0, 5.0, &EMERGENCY, true, false, &mut p);
            assert_eq!(out.purge_j + out.microburst_j, 0.0);
        }
        // Re-enabled: one tick of bursts, not fifty seconds' worth
        let out = g.step(50.0, 5.0, &EMERGENCY, false, true, &mut p);
        assert!(out.microburst_j <= 2.0 * 2.0 + 1e-12);
        assert_eq!(p.gas_remaining_j() + out.microburst_j, 5800.0);
    }

    #[test]
    fn empty_pool_degrades_silently() {
        let mut g = gas(0.0);
        let mut p = ResourcePool::new(&[1.0], 0.0, 0.0).unwrap();
        let first = g.step(0.0, 5.0, &EMERGENCY, false, true, &mut p);
        assert!((first.microburst_j - 1.0).abs() < 1e-12);
        let out = g.step(5.0, 5.0, &EMERGENCY, true, true, &mut p);
        assert_eq!(out.purge_j, 0.0);
        assert_eq!(out.microburst_j, 0.0);
        assert!(!out.purged);
    }
}
