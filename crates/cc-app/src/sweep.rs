//! Parallel parameter sweeps.
//!
//! Each case builds its own [`Engine`] and runs on rayon's pool, so cases
//! share nothing. A case can be cut short by its own observer without
//! touching the others.

use std::ops::ControlFlow;

use cc_project::{GasDef, MAX_CANISTERS, ScenarioConfig};
use cc_sim::{Engine, RunSummary};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Scenario parameters that can be swept by name.
pub const SWEEP_PARAMETERS: &[&str] = &[
    "thermal.initial_c",
    "thermal.capacitance_j_per_c",
    "workload.rated_w",
    "mission.dt_s",
    "mission.duration_s",
    "gas.canister_count",
    "gas.burst_rate_w",
    "tec.max_cooling_w",
    "fan.purge_duty_pct",
    "battery.capacity_wh",
    "policy.purge_c",
    "policy.hysteresis_c",
];

fn set_parameter(config: &mut ScenarioConfig, parameter: &str, value: f64) -> AppResult<()> {
    match parameter {
        "thermal.initial_c" => config.thermal.initial_c = value,
        "thermal.capacitance_j_per_c" => config.thermal.capacitance_j_per_c = value,
        "workload.rated_w" => config.workload.rated_w = value,
        "mission.dt_s" => config.mission.dt_s = value,
        "mission.duration_s" => config.mission.duration_s = value,
        "gas.canister_count" => {
            if value.fract() != 0.0 || value < 1.0 || value > MAX_CANISTERS as f64 {
                return Err(AppError::InvalidInput(format!(
                    "gas.canister_count must be an integer in 1..={MAX_CANISTERS}, got {value}"
                )));
            }
            let capacity_j = config
                .gas
                .canisters
                .first()
                .map_or(2900.0, |c| c.capacity_j);
            config.gas.canisters = GasDef::uniform_canisters(value as usize, capacity_j);
        }
        "gas.burst_rate_w" => config.gas.burst_rate_w = value,
        "tec.max_cooling_w" => config.tec.max_cooling_w = value,
        "fan.purge_duty_pct" => config.fan.purge_duty_pct = value,
        "battery.capacity_wh" => {
            config.battery.capacity_wh = value;
            config.battery.initial_wh = None;
        }
        "policy.purge_c" => config.policy.purge_c = value,
        "policy.hysteresis_c" => config.policy.hysteresis_c = value,
        other => {
            return Err(AppError::InvalidInput(format!(
                "unknown sweep parameter '{other}' (expected one of {})",
                SWEEP_PARAMETERS.join(", ")
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct SweepCase {
    pub label: String,
    pub value: f64,
    pub config: ScenarioConfig,
}

/// One case per value, each a copy of `base` with `parameter` replaced.
pub fn vary(base: &ScenarioConfig, parameter: &str, values: &[f64]) -> AppResult<Vec<SweepCase>> {
    values
        .iter()
        .map(|&value| {
            let mut config = base.clone();
            set_parameter(&mut config, parameter, value)?;
            config.name = format!("{}[{parameter}={value}]", base.name);
            Ok(SweepCase {
                label: format!("{parameter}={value}"),
                value,
                config,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct SweepOptions {
    /// Stop a case as soon as its temperature exceeds this value.
    pub abort_above_c: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub label: String,
    pub value: f64,
    /// The case's summary, or the reason it could not be built.
    pub result: Result<RunSummary, String>,
}

/// Run every case in parallel. Outcomes keep the order of `cases`.
pub fn run_sweep(cases: &[SweepCase], options: &SweepOptions) -> Vec<SweepOutcome> {
    cases
        .par_iter()
        .map(|case| {
            let result = Engine::new(&case.config)
                .map(|engine| {
                    engine
                        .run_with(|record| match options.abort_above_c {
                            Some(limit) if record.temperature_c > limit => ControlFlow::Break(()),
                            _ => ControlFlow::Continue(()),
                        })
                        .summary
                })
                .map_err(|e| e.to_string());
            debug!(case = %case.label, ok = result.is_ok(), "sweep case finished");
            SweepOutcome {
                label: case.label.clone(),
                value: case.value,
                result,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_project::presets;

    #[test]
    fn vary_rewrites_one_parameter() {
        let base = presets::tactical();
        let cases = vary(&base, "gas.canister_count", &[1.0, 3.0]).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].config.gas.canisters.len(), 1);
        assert_eq!(cases[1].config.gas.canisters.len(), 3);
        assert_eq!(cases[1].config.thermal, base.thermal);
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        assert!(vary(&presets::tactical(), "thermal.colour", &[1.0]).is_err());
        assert!(vary(&presets::tactical(), "gas.canister_count", &[1.5]).is_err());
    }

    #[test]
    fn canister_count_is_bounded() {
        let base = presets::tactical();
        for value in [1e300, f64::INFINITY, f64::NAN, 1025.0] {
            assert!(vary(&base, "gas.canister_count", &[value]).is_err(), "{value}");
        }
        let cases = vary(&base, "gas.canister_count", &[1024.0]).unwrap();
        assert_eq!(cases[0].config.gas.canisters.len(), MAX_CANISTERS);
    }

    #[test]
    fn astronomical_duration_fails_its_case_only() {
        let cases = vary(&presets::tactical(), "mission.duration_s", &[1e300, 60.0]).unwrap();
        let outcomes = run_sweep(&cases, &SweepOptions::default());
        assert!(outcomes[0].result.is_err());
        assert_eq!(outcomes[1].result.as_ref().map(|s| s.ticks), Ok(12));
    }
}
