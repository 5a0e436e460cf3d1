//! Trace records, events, energy ledger and run summary.

use crate::guard::Instability;
use crate::tec::TecShutdown;
use cc_controls::Mode;
use cc_core::percent_of;
use serde::{Deserialize, Serialize};

/// Per-mechanism cooling. Watts in a [`TickRecord`], joules in a [`Ledger`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Contributions {
    pub passive: f64,
    pub microburst: f64,
    pub purge: f64,
    pub afterglow: f64,
    pub tec: f64,
    /// Extra cooling from the fan multiplier on top of everything else.
    pub fan_boost: f64,
}

impl Contributions {
    /// Everything except the fan share.
    pub fn base(&self) -> f64 {
        self.passive + self.microburst + self.purge + self.afterglow + self.tec
    }

    pub fn sum(&self) -> f64 {
        self.base() + self.fan_boost
    }

    pub fn scaled(&self, k: f64) -> Self {
        Self {
            passive: self.passive * k,
            microburst: self.microburst * k,
            purge: self.purge * k,
            afterglow: self.afterglow * k,
            tec: self.tec * k,
            fan_boost: self.fan_boost * k,
        }
    }

    pub fn accumulate(&mut self, other: &Contributions) {
        self.passive += other.passive;
        self.microburst += other.microburst;
        self.purge += other.purge;
        self.afterglow += other.afterglow;
        self.tec += other.tec;
        self.fan_boost += other.fan_boost;
    }

    /// Each entry as a percentage of the sum.
    pub fn shares_pct(&self) -> Self {
        let total = self.sum();
        Self {
            passive: percent_of(self.passive, total),
            microburst: percent_of(self.microburst, total),
            purge: percent_of(self.purge, total),
            afterglow: percent_of(self.afterglow, total),
            tec: percent_of(self.tec, total),
            fan_boost: percent_of(self.fan_boost, total),
        }
    }

    pub fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("passive", self.passive),
            ("microburst", self.microburst),
            ("purge", self.purge),
            ("afterglow", self.afterglow),
            ("tec", self.tec),
            ("fan_boost", self.fan_boost),
        ]
    }
}

/// Energy totals over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub heat_in_j: f64,
    pub cooling_j: Contributions,
    /// Energy left in the thermal mass: `C · (final − initial)`.
    pub stored_j: f64,
}

impl Ledger {
    pub fn cooling_total_j(&self) -> f64 {
        self.cooling_j.sum()
    }

    /// `heat_in − cooling − stored`; zero up to rounding.
    pub fn residual_j(&self) -> f64 {
        self.heat_in_j - self.cooling_total_j() - self.stored_j
    }

    pub fn shares_pct(&self) -> Contributions {
        self.cooling_j.shares_pct()
    }
}

/// One simulated tick.
///
/// `time_s` is the start of the tick; temperatures are at its end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub tick: usize,
    pub time_s: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<usize>,
    pub heat_w: f64,
    pub temperature_c: f64,
    pub mode: Mode,
    pub purge: bool,
    pub canister_index: usize,
    pub gas_remaining_j: f64,
    pub battery_remaining_wh: f64,
    pub fan_duty_pct: f64,
    pub fan_multiplier: f64,
    pub tec_enabled: bool,
    pub tec_hot_side_c: f64,
    pub cooling_w: Contributions,
    pub cooling_total_w: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventKind {
    PhaseStarted { index: usize, name: String },
    CanisterDepleted { index: usize },
    CanisterSwitched { from: usize, to: usize },
    GasExhausted,
    BatteryDepleted,
    Purge { released_j: f64 },
    TecShutdown { reason: TecShutdown },
    ThermalExceedance { temperature_c: f64 },
    NumericalInstability { kind: Instability, delta_c: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub time_s: f64,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn is_pass(self) -> bool {
        self == Verdict::Pass
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASS"),
            Verdict::Fail => write!(f, "FAIL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub scenario: String,
    pub ticks: usize,
    pub simulated_s: f64,
    pub critical_c: f64,
    pub initial_c: f64,
    pub final_c: f64,
    pub peak_c: f64,
    pub peak_time_s: f64,
    pub verdict: Verdict,
    pub ledger: Ledger,
    pub gas_used_pct: f64,
    pub battery_used_pct: f64,
    pub purge_count: usize,
    pub canister_switches: usize,
    pub instability_count: usize,
    /// Stopped early on a non-finite temperature.
    pub halted: bool,
    /// Stopped early by the caller.
    pub aborted: bool,
    /// Worst-case per-tick temperature change estimated at construction.
    pub truncation_bound_c: f64,
    pub events: Vec<SimEvent>,
}

/// Trace plus summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimOutput {
    pub records: Vec<TickRecord>,
    pub summary: RunSummary,
}
