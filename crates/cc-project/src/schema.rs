//! Scenario configuration schema.

use cc_controls::PolicyConfig;
use serde::{Deserialize, Serialize};

fn latest_version() -> u32 {
    crate::migrate::LATEST_VERSION
}

fn one() -> usize {
    1
}

fn default_max_step_delta_c() -> f64 {
    30.0
}

fn enabled() -> bool {
    true
}

fn default_reserve_on_wh() -> f64 {
    5.0
}

fn default_reserve_off_wh() -> f64 {
    3.0
}

/// Longest mission the engine will schedule, in ticks.
pub const MAX_TICKS: usize = 10_000_000;

/// Most canisters one loadout may carry.
pub const MAX_CANISTERS: usize = 1024;

/// Everything needed to run one mission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioConfig {
    #[serde(default = "latest_version")]
    pub version: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub mission: MissionDef,
    pub thermal: ThermalDef,
    pub workload: WorkloadDef,
    pub passive: PassiveDef,
    pub gas: GasDef,
    pub tec: TecDef,
    pub fan: FanDef,
    pub battery: BatteryDef,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<PhaseDef>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        crate::presets::tactical()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MissionDef {
    pub duration_s: f64,
    pub dt_s: f64,
    pub critical_c: f64,
    /// Per-tick temperature change treated as numerically suspect.
    #[serde(default = "default_max_step_delta_c")]
    pub max_step_delta_c: f64,
    /// Keep every N-th tick in the recorded trace.
    #[serde(default = "one")]
    pub record_every: usize,
}

impl MissionDef {
    /// Exact tick count covering `[0, duration_s)`, before any cap.
    pub fn tick_count_f64(&self) -> f64 {
        if self.duration_s <= 0.0 || self.dt_s <= 0.0 {
            return 0.0;
        }
        let exact = self.duration_s / self.dt_s;
        let rounded = exact.round();
        if (exact - rounded).abs() < 1e-9 {
            rounded
        } else {
            exact.ceil()
        }
    }

    /// Number of ticks covering `[0, duration_s)`, capped at [`MAX_TICKS`].
    pub fn tick_count(&self) -> usize {
        let ticks = self.tick_count_f64();
        if ticks.is_nan() {
            return 0;
        }
        ticks.min(MAX_TICKS as f64) as usize
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThermalDef {
    pub capacitance_j_per_c: f64,
    pub initial_c: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkloadDef {
    pub rated_w: f64,
    pub base_fraction: f64,
    #[serde(default)]
    pub variation_fraction: f64,
    pub variation_period_s: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stress_windows: Vec<StressWindowDef>,
}

/// Open interval `(start_s, end_s)` during which output is pinned to
/// `level_fraction` of rated power.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StressWindowDef {
    pub start_s: f64,
    pub end_s: f64,
    pub level_fraction: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum PassiveDef {
    /// Fixed dissipation regardless of temperature.
    Constant { watts: f64 },
    /// Conduction to surroundings, never negative.
    Ambient {
        w_per_c: f64,
        /// Mean ambient temperature.
        ambient_c: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        swing: Option<AmbientSwing>,
    },
}

/// Sinusoidal day/night cycle around the mean ambient temperature.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AmbientSwing {
    pub amplitude_c: f64,
    pub period_s: f64,
}

impl PassiveDef {
    /// Ambient temperature at mission time `t_s`, `None` for constant dissipation.
    pub fn ambient_at(&self, t_s: f64) -> Option<f64> {
        match *self {
            PassiveDef::Constant { .. } => None,
            PassiveDef::Ambient {
                ambient_c, swing, ..
            } => Some(match swing {
                Some(AmbientSwing {
                    amplitude_c,
                    period_s,
                }) => ambient_c + amplitude_c * (std::f64::consts::TAU * t_s / period_s).sin(),
                None => ambient_c,
            }),
        }
    }

    /// Coolest ambient over the cycle.
    pub fn ambient_min(&self) -> Option<f64> {
        match *self {
            PassiveDef::Constant { .. } => None,
            PassiveDef::Ambient {
                ambient_c, swing, ..
            } => Some(ambient_c - swing.map_or(0.0, |s| s.amplitude_c.abs())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanisterDef {
    pub capacity_j: f64,
}

/// When microbursts fire relative to the control tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BurstSchedule {
    /// Bursts run on their own clock from t = 0 and may straddle ticks.
    #[default]
    Continuous,
    /// A burst fires only on a tick whose start lies on the interval grid,
    /// and lasts at most one tick.
    TickAligned,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GasDef {
    #[serde(default)]
    pub canisters: Vec<CanisterDef>,
    /// Version 1 files describe identical canisters by count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canister_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canister_capacity_j: Option<f64>,
    /// Cooling power while a microburst valve is open (J/s).
    pub burst_rate_w: f64,
    #[serde(default)]
    pub burst_schedule: BurstSchedule,
    /// Fraction of a canister's capacity released by one purge.
    pub purge_efficiency: f64,
    pub afterglow_w: f64,
    pub afterglow_s: f64,
    /// Afterglow window restarted at the end of each microburst; 0 disables.
    #[serde(default)]
    pub microburst_afterglow_s: f64,
}

impl GasDef {
    pub fn uniform_canisters(count: usize, capacity_j: f64) -> Vec<CanisterDef> {
        vec![CanisterDef { capacity_j }; count]
    }

    pub fn total_capacity_j(&self) -> f64 {
        self.canisters.iter().map(|c| c.capacity_j).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TecDef {
    pub max_cooling_w: f64,
    pub draw_w: f64,
    pub base_efficiency: f64,
    pub min_efficiency: f64,
    /// Hot-to-die differential at which efficiency reaches zero before clamping.
    pub derate_span_c: f64,
    /// Above this hot-side temperature efficiency is multiplied by `derate_factor`.
    pub derate_hot_c: f64,
    pub derate_factor: f64,
    pub max_runtime_s: f64,
    pub cooldown_s: f64,
    pub shutdown_hot_c: f64,
    pub resume_hot_c: f64,
    pub hot_side_capacitance_j_per_c: f64,
    /// Heat the hot-side sink sheds while running (W).
    pub reject_w: f64,
    /// Hot-side relaxation toward die temperature while off (°C/s).
    pub recovery_c_per_s: f64,
    /// Window after a purge during which the TEC is requested regardless of mode.
    #[serde(default)]
    pub assist_after_purge_s: f64,
    /// Battery charge needed to switch the TEC on.
    #[serde(default = "default_reserve_on_wh")]
    pub reserve_on_wh: f64,
    /// A running TEC stops once the battery falls below this.
    #[serde(default = "default_reserve_off_wh")]
    pub reserve_off_wh: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FanDef {
    /// Battery draw at 100 % duty (W).
    pub draw_w: f64,
    /// Convective factor at 100 % duty.
    pub multiplier_base: f64,
    /// Additional airflow gain at 100 % duty.
    pub speed_gain: f64,
    pub multiplier_min: f64,
    pub multiplier_max: f64,
    /// Extra fractional boost right after a purge, decaying over the window.
    pub purge_boost: f64,
    pub boost_window_s: f64,
    /// Duty floor during the boost window; 0 leaves the mode table in charge.
    #[serde(default)]
    pub purge_duty_pct: f64,
    pub ramp_up_s: f64,
    pub ramp_down_s: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatteryDef {
    pub capacity_wh: f64,
    /// Starting charge; full when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_wh: Option<f64>,
}

impl BatteryDef {
    pub fn initial_charge_wh(&self) -> f64 {
        self.initial_wh.unwrap_or(self.capacity_wh)
    }
}

/// A slice of the mission with its own mechanism gating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseDef {
    pub name: String,
    pub duration_s: f64,
    #[serde(default = "enabled")]
    pub gas: bool,
    #[serde(default = "enabled")]
    pub tec: bool,
    #[serde(default = "enabled")]
    pub fan: bool,
}
