//! Fixed-step simulation loop.
//!
//! Tick `k` covers `[k·dt, (k+1)·dt)`. Each tick evaluates, in order: the
//! workload, the control policy, the gas mechanisms (purge, microburst,
//! afterglow), the TEC and fan, then sums the cooling, integrates the thermal
//! node and records the result. A breach of the critical temperature is
//! recorded and the loop carries on.

use std::ops::ControlFlow;

use crate::error::SimResult;
use crate::fan::Fan;
use crate::gas::GasSystem;
use crate::guard::{Instability, NumericalGuard, truncation_bound_c};
use crate::passive::Passive;
use crate::phases::PhasePlan;
use crate::record::{
    Contributions, EventKind, Ledger, RunSummary, SimEvent, SimOutput, TickRecord, Verdict,
};
use crate::resources::{ResourceEvent, ResourcePool};
use crate::tec::Tec;
use crate::thermal::ThermalState;
use crate::workload::Workload;
use cc_controls::ControlPolicy;
use cc_project::{ScenarioConfig, validate_config};
use tracing::{debug, info, warn};

/// Trace slots reserved up front; longer traces grow on demand.
const MAX_PREALLOCATED_RECORDS: usize = 1 << 16;

/// Cooling capacity used to size the truncation bound.
fn cooling_scale_w(config: &ScenarioConfig) -> f64 {
    let passive = Passive::from(&config.passive).peak_power_w(config.mission.critical_c);
    let continuous = passive + config.gas.burst_rate_w + config.gas.afterglow_w
        + config.tec.max_cooling_w;
    let largest_canister = config
        .gas
        .canisters
        .iter()
        .map(|c| c.capacity_j)
        .fold(0.0, f64::max);
    let purge_w = largest_canister * config.gas.purge_efficiency / config.mission.dt_s;
    continuous * config.fan.multiplier_max + purge_w
}

pub struct Engine {
    name: String,
    dt_s: f64,
    critical_c: f64,
    record_every: usize,
    assist_after_purge_s: f64,
    total_ticks: usize,
    tick: usize,

    workload: Workload,
    passive: Passive,
    policy: ControlPolicy,
    gas: GasSystem,
    tec: Tec,
    fan: Fan,
    pool: ResourcePool,
    thermal: ThermalState,
    phases: PhasePlan,
    current_phase: Option<usize>,
    guard: NumericalGuard,
    truncation_bound_c: f64,

    since_purge_s: Option<f64>,
    initial_c: f64,
    peak_c: f64,
    peak_time_s: f64,
    exceeded: bool,
    halted: bool,
    ledger: Ledger,
    events: Vec<SimEvent>,
    canister_switches: usize,
    instability_count: usize,
}

impl Engine {
    /// Build an engine from a validated configuration.
    pub fn new(config: &ScenarioConfig) -> SimResult<Self> {
        validate_config(config)?;
        let mission = &config.mission;

        let capacities: Vec<f64> = config.gas.canisters.iter().map(|c| c.capacity_j).collect();
        let pool = ResourcePool::new(
            &capacities,
            config.battery.capacity_wh,
            config.battery.initial_charge_wh(),
        )?;
        let thermal =
            ThermalState::new(config.thermal.initial_c, config.thermal.capacitance_j_per_c)?;
        let policy = ControlPolicy::new(config.policy.clone())?;
        let workload = Workload::new(config.workload.clone());

        let bound = truncation_bound_c(
            mission.dt_s,
            workload.peak_w(),
            cooling_scale_w(config),
            config.thermal.capacitance_j_per_c,
        );
        if bound > mission.max_step_delta_c {
            warn!(
                scenario = %config.name,
                bound_c = bound,
                limit_c = mission.max_step_delta_c,
                "timestep may be too coarse for the thermal capacitance"
            );
        }

        Ok(Self {
            name: config.name.clone(),
            dt_s: mission.dt_s,
            critical_c: mission.critical_c,
            record_every: mission.record_every.max(1),
            assist_after_purge_s: config.tec.assist_after_purge_s,
            total_ticks: mission.tick_count(),
            tick: 0,
            workload,
            passive: Passive::from(&config.passive),
            policy,
            gas: GasSystem::new(&config.gas),
            tec: Tec::new(config.tec.clone(), config.thermal.initial_c),
            fan: Fan::new(config.fan.clone()),
            pool,
            thermal,
            phases: PhasePlan::new(&config.phases),
            current_phase: None,
            guard: NumericalGuard::new(mission.max_step_delta_c, bound),
            truncation_bound_c: bound,
            since_purge_s: None,
            initial_c: config.thermal.initial_c,
            peak_c: config.thermal.initial_c,
            peak_time_s: 0.0,
            exceeded: false,
            halted: false,
            ledger: Ledger::default(),
            events: Vec::new(),
            canister_switches: 0,
            instability_count: 0,
        })
    }

    pub fn tick_count(&self) -> usize {
        self.total_ticks
    }

    pub fn ticks_done(&self) -> usize {
        self.tick
    }

    pub fn is_finished(&self) -> bool {
        self.halted || self.tick >= self.total_ticks
    }

    pub fn temperature_c(&self) -> f64 {
        self.thermal.temperature_c()
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn truncation_bound_c(&self) -> f64 {
        self.truncation_bound_c
    }

    fn push_event(&mut self, time_s: f64, kind: EventKind) {
        debug!(scenario = %self.name, time_s, event = ?kind, "simulation event");
        self.events.push(SimEvent { time_s, kind });
    }

    fn enter_phase(&mut self, t: f64) -> Option<usize> {
        let phase = self.phases.index_at(t);
        if phase != self.current_phase {
            self.current_phase = phase;
            if let Some(index) = phase {
                let name = self.phases.name(index).unwrap_or_default().to_string();
                self.push_event(t, EventKind::PhaseStarted { index, name });
            }
        }
        phase
    }

    fn drain_resource_events(&mut self, t: f64) {
        for event in self.pool.take_events() {
            let kind = match event {
                ResourceEvent::CanisterDepleted { index } => EventKind::CanisterDepleted { index },
                ResourceEvent::CanisterSwitched { from, to } => {
                    self.canister_switches += 1;
                    EventKind::CanisterSwitched { from, to }
                }
                ResourceEvent::GasExhausted => EventKind::GasExhausted,
                ResourceEvent::BatteryDepleted => EventKind::BatteryDepleted,
            };
            self.push_event(t, kind);
        }
    }

    /// Advance one tick. Returns `None` once the mission is over.
    pub fn step(&mut self) -> Option<TickRecord> {
        if self.is_finished() {
            return None;
        }
        let dt = self.dt_s;
        let t = self.tick as f64 * dt;
        let before_c = self.thermal.temperature_c();

        let phase = self.enter_phase(t);
        let gate = self.phases.gate_at(t);

        let heat_w = self.workload.heat_input_w(t);
        let decision = self.policy.decide(before_c);

        let gas = self.gas.step(
            t,
            dt,
            &decision.actuation,
            decision.purge,
            gate.gas,
            &mut self.pool,
        );
        if gas.purged {
            self.since_purge_s = Some(0.0);
            self.push_event(
                t,
                EventKind::Purge {
                    released_j: gas.purge_j,
                },
            );
        }

        let assist = self
            .since_purge_s
            .is_some_and(|s| s > 0.0 && s < self.assist_after_purge_s);
        let tec_requested = gate.tec && (decision.actuation.tec_on || assist);
        let tec = self.tec.step(t, dt, before_c, tec_requested, &mut self.pool);
        if let Some(reason) = tec.shutdown {
            self.push_event(t, EventKind::TecShutdown { reason });
        }

        let multiplier = self.fan.step(
            dt,
            decision.actuation.fan_duty_pct,
            gate.fan,
            &mut self.pool,
        );
        // The boost window opens on the tick after the purge.
        if gas.purged {
            self.fan.start_boost();
        }
        if let Some(s) = self.since_purge_s.as_mut() {
            *s += dt;
        }

        let mut cooling = Contributions {
            passive: self.passive.power_w(before_c, t),
            microburst: gas.microburst_j / dt,
            purge: gas.purge_j / dt,
            afterglow: gas.afterglow_w,
            tec: tec.cooling_w,
            fan_boost: 0.0,
        };
        cooling.fan_boost = (multiplier - 1.0) * cooling.base();
        let cooling_total_w = cooling.sum();

        let after_c = self.thermal.integrate(heat_w, cooling_total_w, dt);
        self.ledger.heat_in_j += heat_w * dt;
        self.ledger.cooling_j.accumulate(&cooling.scaled(dt));

        self.drain_resource_events(t);

        if after_c > self.peak_c {
            self.peak_c = after_c;
            self.peak_time_s = t + dt;
        }
        if !self.exceeded && after_c > self.critical_c {
            self.exceeded = true;
            self.push_event(
                t + dt,
                EventKind::ThermalExceedance {
                    temperature_c: after_c,
                },
            );
        }
        if let Some((kind, delta_c)) = self.guard.check(before_c, after_c) {
            warn!(scenario = %self.name, time_s = t, ?kind, delta_c, "numerical instability");
            self.instability_count += 1;
            if kind == Instability::NonFinite {
                self.halted = true;
            }
            self.push_event(t, EventKind::NumericalInstability { kind, delta_c });
        }

        let fan = self.fan.state();
        let record = TickRecord {
            tick: self.tick,
            time_s: t,
            phase,
            heat_w,
            temperature_c: after_c,
            mode: decision.mode,
            purge: gas.purged,
            canister_index: self.pool.active_index(),
            gas_remaining_j: self.pool.gas_remaining_j(),
            battery_remaining_wh: self.pool.battery_remaining_wh(),
            fan_duty_pct: fan.duty_pct,
            fan_multiplier: multiplier,
            tec_enabled: self.tec.state().enabled,
            tec_hot_side_c: self.tec.state().hot_side_temp_c,
            cooling_w: cooling,
            cooling_total_w,
        };
        self.tick += 1;
        Some(record)
    }

    /// Run to the end of the mission.
    pub fn run(self) -> SimOutput {
        self.run_with(|_| ControlFlow::Continue(()))
    }

    /// Run to the end, showing every tick to `observer`. Returning
    /// `ControlFlow::Break` stops the run and flags the output as aborted.
    pub fn run_with<F>(mut self, mut observer: F) -> SimOutput
    where
        F: FnMut(&TickRecord) -> ControlFlow<()>,
    {
        info!(
            scenario = %self.name,
            ticks = self.total_ticks,
            dt_s = self.dt_s,
            "simulation started"
        );
        let expected = (self.total_ticks / self.record_every).saturating_add(1);
        let mut records = Vec::with_capacity(expected.min(MAX_PREALLOCATED_RECORDS));
        let mut aborted = false;
        while let Some(record) = self.step() {
            let flow = observer(&record);
            let last = self.is_finished() || flow.is_break();
            if record.tick % self.record_every == 0 || last {
                records.push(record);
            }
            if flow.is_break() {
                aborted = true;
                break;
            }
        }

        let mut summary = self.summary();
        summary.aborted = aborted;
        info!(
            scenario = %summary.scenario,
            verdict = %summary.verdict,
            final_c = summary.final_c,
            peak_c = summary.peak_c,
            gas_used_pct = summary.gas_used_pct,
            battery_used_pct = summary.battery_used_pct,
            aborted,
            "simulation finished"
        );
        SimOutput { records, summary }
    }

    /// Summary of the ticks run so far.
    pub fn summary(&self) -> RunSummary {
        let final_c = self.thermal.temperature_c();
        let mut ledger = self.ledger;
        ledger.stored_j = self.thermal.capacitance_j_per_c() * (final_c - self.initial_c);
        let within = |c: f64| c <= self.critical_c;
        let verdict = if !self.halted && within(self.peak_c) && within(final_c) {
            Verdict::Pass
        } else {
            Verdict::Fail
        };
        RunSummary {
            scenario: self.name.clone(),
            ticks: self.tick,
            simulated_s: self.tick as f64 * self.dt_s,
            critical_c: self.critical_c,
            initial_c: self.initial_c,
            final_c,
            peak_c: self.peak_c,
            peak_time_s: self.peak_time_s,
            verdict,
            ledger,
            gas_used_pct: self.pool.gas_used_pct(),
            battery_used_pct: self.pool.battery_used_pct(),
            purge_count: self.gas.purge_count(),
            canister_switches: self.canister_switches,
            instability_count: self.instability_count,
            halted: self.halted,
            aborted: false,
            truncation_bound_c: self.truncation_bound_c,
            events: self.events.clone(),
        }
    }
}

/// Build and run `config` to completion.
pub fn simulate(config: &ScenarioConfig) -> SimResult<SimOutput> {
    Ok(Engine::new(config)?.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_project::presets;

    #[test]
    fn invalid_config_is_rejected_before_any_tick() {
        let mut config = presets::tactical();
        config.thermal.capacitance_j_per_c = 0.0;
        assert!(matches!(
            Engine::new(&config),
            Err(crate::SimError::Config(_))
        ));
    }

    #[test]
    fn tick_times_are_multiples_of_dt() {
        let mut config = presets::tactical();
        config.mission.duration_s = 50.0;
        let out = simulate(&config).unwrap();
        assert_eq!(out.records.len(), 10);
        for (k, r) in out.records.iter().enumerate() {
            assert_eq!(r.tick, k);
            assert_eq!(r.time_s, k as f64 * 5.0);
        }
    }

    #[test]
    fn step_stops_at_mission_end() {
        let mut config = presets::tactical();
        config.mission.duration_s = 10.0;
        let mut engine = Engine::new(&config).unwrap();
        assert!(engine.step().is_some());
        assert!(engine.step().is_some());
        assert!(engine.step().is_none());
        assert!(engine.is_finished());
    }

    #[test]
    fn record_every_keeps_last_tick() {
        let mut config = presets::tactical();
        config.mission.duration_s = 60.0;
        config.mission.record_every = 5;
        let out = simulate(&config).unwrap();
        let ticks: Vec<usize> = out.records.iter().map(|r| r.tick).collect();
        assert_eq!(ticks, vec![0, 5, 10, 11]);
        assert_eq!(out.summary.ticks, 12);
    }

    #[test]
    fn observer_can_abort() {
        let config = presets::tactical();
        let out = Engine::new(&config)
            .unwrap()
            .run_with(|r| {
                if r.tick == 9 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            });
        assert!(out.summary.aborted);
        assert_eq!(out.summary.ticks, 10);
        assert_eq!(out.records.last().map(|r| r.tick), Some(9));
    }

    #[test]
    fn fan_boost_closes_the_sum() {
        let out = simulate(&presets::tactical()).unwrap();
        for r in &out.records {
            let expected = r.cooling_w.base() * r.fan_multiplier;
            assert!((r.cooling_total_w - expected).abs() < 1e-9 * expected.max(1.0));
        }
    }

    #[test]
    fn tactical_bound_is_below_step_limit() {
        let engine = Engine::new(&presets::tactical()).unwrap();
        assert!(engine.truncation_bound_c() > 0.0);
        assert!(engine.truncation_bound_c() < 30.0);
    }
}
