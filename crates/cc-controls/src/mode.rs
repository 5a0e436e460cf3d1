//! Cooling modes and the per-mode actuation table.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete cooling mode, ordered from least to most aggressive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Idle,
    Active,
    High,
    Emergency,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Idle, Mode::Active, Mode::High, Mode::Emergency];

    /// Next less aggressive mode, `None` for IDLE.
    pub fn lower(self) -> Option<Mode> {
        match self {
            Mode::Idle => None,
            Mode::Active => Some(Mode::Idle),
            Mode::High => Some(Mode::Active),
            Mode::Emergency => Some(Mode::High),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Idle => "IDLE",
            Mode::Active => "ACTIVE",
            Mode::High => "HIGH",
            Mode::Emergency => "EMERGENCY",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_emergency_actuation_c() -> f64 {
    75.0
}

/// Lower temperature bound (°C, closed) of each mode above IDLE.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeThresholds {
    pub active_c: f64,
    pub high_c: f64,
    pub emergency_c: f64,
    /// From here up HIGH already drives the EMERGENCY actuation row.
    #[serde(default = "default_emergency_actuation_c")]
    pub emergency_actuation_c: f64,
}

impl Default for ModeThresholds {
    fn default() -> Self {
        Self {
            active_c: 60.0,
            high_c: 70.0,
            emergency_c: 78.0,
            emergency_actuation_c: default_emergency_actuation_c(),
        }
    }
}

impl ModeThresholds {
    pub fn validate(&self) -> ControlResult<()> {
        cc_core::ensure_finite(self.active_c, "active threshold")?;
        cc_core::ensure_finite(self.high_c, "high threshold")?;
        cc_core::ensure_finite(self.emergency_c, "emergency threshold")?;
        if !(self.active_c < self.high_c && self.high_c < self.emergency_c) {
            return Err(ControlError::ThresholdOrder {
                what: format!(
                    "expected active < high < emergency, got {} / {} / {}",
                    self.active_c, self.high_c, self.emergency_c
                ),
            });
        }
        cc_core::ensure_within(
            self.emergency_actuation_c,
            self.high_c,
            self.emergency_c,
            "emergency actuation threshold",
        )?;
        Ok(())
    }

    /// Actuation row for `mode` at `temp_c`.
    pub fn actuation_mode(&self, mode: Mode, temp_c: f64) -> Mode {
        if mode == Mode::High && temp_c >= self.emergency_actuation_c {
            Mode::Emergency
        } else {
            mode
        }
    }

    /// Lower bound of `mode`; IDLE is unbounded below.
    pub fn lower_bound(&self, mode: Mode) -> f64 {
        match mode {
            Mode::Idle => f64::NEG_INFINITY,
            Mode::Active => self.active_c,
            Mode::High => self.high_c,
            Mode::Emergency => self.emergency_c,
        }
    }

    /// Mode for `temp_c`. Lower bounds are inclusive.
    pub fn classify(&self, temp_c: f64) -> Mode {
        if temp_c >= self.emergency_c {
            Mode::Emergency
        } else if temp_c >= self.high_c {
            Mode::High
        } else if temp_c >= self.active_c {
            Mode::Active
        } else {
            Mode::Idle
        }
    }
}

/// What a mode asks of the cooling hardware.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Actuation {
    /// Microburst valve-open time per interval (s).
    pub burst_s: f64,
    /// Microburst period (s).
    pub interval_s: f64,
    /// Target fan duty (%).
    pub fan_duty_pct: f64,
    /// Whether the TEC is requested.
    pub tec_on: bool,
}

impl Actuation {
    pub const fn new(burst_s: f64, interval_s: f64, fan_duty_pct: f64, tec_on: bool) -> Self {
        Self {
            burst_s,
            interval_s,
            fan_duty_pct,
            tec_on,
        }
    }

    fn validate(&self, mode: Mode) -> ControlResult<()> {
        let bad = |what| ControlError::InvalidActuation {
            mode: mode.to_string(),
            what,
        };
        if !(self.interval_s.is_finite() && self.interval_s > 0.0) {
            return Err(bad("interval_s must be positive and finite"));
        }
        if !(self.burst_s.is_finite() && self.burst_s >= 0.0) {
            return Err(bad("burst_s must be non-negative and finite"));
        }
        if self.burst_s > self.interval_s {
            return Err(bad("burst_s must not exceed interval_s"));
        }
        if cc_core::ensure_within(self.fan_duty_pct, 0.0, 100.0, "fan duty").is_err() {
            return Err(bad("fan_duty_pct must be within 0..=100"));
        }
        Ok(())
    }
}

/// One actuation per mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuationTable {
    pub idle: Actuation,
    pub active: Actuation,
    pub high: Actuation,
    pub emergency: Actuation,
}

impl Default for ActuationTable {
    fn default() -> Self {
        Self {
            idle: Actuation::new(0.3, 8.0, 0.0, false),
            active: Actuation::new(0.5, 5.0, 30.0, false),
            high: Actuation::new(0.7, 4.0, 50.0, true),
            emergency: Actuation::new(1.0, 3.0, 100.0, true),
        }
    }
}

impl ActuationTable {
    pub fn get(&self, mode: Mode) -> &Actuation {
        match mode {
            Mode::Idle => &self.idle,
            Mode::Active => &self.active,
            Mode::High => &self.high,
            Mode::Emergency => &self.emergency,
        }
    }

    pub fn validate(&self) -> ControlResult<()> {
        for mode in Mode::ALL {
            self.get(mode).validate(mode)?;
        }
        Ok(())
    }

    /// Rows in mode order, as `(mode, actuation)`.
    pub fn rows(&self) -> impl Iterator<Item = (Mode, &Actuation)> + '_ {
        Mode::ALL.into_iter().map(move |m| (m, self.get(m)))
    }
}
