//! Temperature-driven control policy.
//!
//! The reference policy is stateless: the mode is a pure function of the
//! current temperature. A non-zero `hysteresis_c` makes the policy hold a
//! higher mode on the way down until the temperature clears that mode's lower
//! bound by the configured margin.
//!
//! Within HIGH, temperatures at or above `emergency_actuation_c` already get
//! the EMERGENCY actuation row while the reported mode stays HIGH.

use crate::error::{ControlError, ControlResult};
use crate::mode::{Actuation, ActuationTable, Mode, ModeThresholds};
use serde::{Deserialize, Serialize};

/// Control policy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub thresholds: ModeThresholds,
    #[serde(default)]
    pub table: ActuationTable,
    /// Temperature (°C) above which an emergency purge is requested.
    pub purge_c: f64,
    /// Downward hysteresis margin (°C). Zero keeps the stateless mapping.
    #[serde(default)]
    pub hysteresis_c: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            thresholds: ModeThresholds::default(),
            table: ActuationTable::default(),
            purge_c: 85.0,
            hysteresis_c: 0.0,
        }
    }
}

impl PolicyConfig {
    pub fn validate(&self) -> ControlResult<()> {
        self.thresholds.validate()?;
        self.table.validate()?;
        cc_core::ensure_finite(self.purge_c, "purge threshold")?;
        if self.purge_c <= self.thresholds.emergency_c {
            return Err(ControlError::ThresholdOrder {
                what: format!(
                    "purge threshold {} must exceed emergency threshold {}",
                    self.purge_c, self.thresholds.emergency_c
                ),
            });
        }
        if !(self.hysteresis_c.is_finite() && self.hysteresis_c >= 0.0) {
            return Err(ControlError::InvalidArg {
                what: "hysteresis_c must be non-negative and finite",
            });
        }
        Ok(())
    }
}

/// Output of one policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub mode: Mode,
    pub actuation: Actuation,
    pub purge: bool,
}

/// Mode selection state machine.
#[derive(Debug, Clone)]
pub struct ControlPolicy {
    config: PolicyConfig,
    last_mode: Option<Mode>,
}

impl ControlPolicy {
    pub fn new(config: PolicyConfig) -> ControlResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            last_mode: None,
        })
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Stateless mode for `temp_c`.
    pub fn mode_for(&self, temp_c: f64) -> Mode {
        self.config.thresholds.classify(temp_c)
    }

    /// Whether `temp_c` requests an emergency purge.
    pub fn purge_requested(&self, temp_c: f64) -> bool {
        temp_c > self.config.purge_c
    }

    /// Evaluate the policy for this sample and remember the chosen mode.
    pub fn decide(&mut self, temp_c: f64) -> Decision {
        let raw = self.mode_for(temp_c);
        let mode = match self.last_mode {
            Some(last) if self.config.hysteresis_c > 0.0 && last > raw => {
                self.hold_down(last, raw, temp_c)
            }
            _ => raw,
        };
        self.last_mode = Some(mode);
        let row = self.config.thresholds.actuation_mode(mode, temp_c);
        Decision {
            mode,
            actuation: *self.config.table.get(row),
            purge: self.purge_requested(temp_c),
        }
    }

    /// Step down from `last` one band at a time while the temperature has
    /// cleared the band's lower bound by the hysteresis margin.
    fn hold_down(&self, last: Mode, raw: Mode, temp_c: f64) -> Mode {
        let th = &self.config.thresholds;
        let mut mode = last;
        while mode > raw && temp_c < th.lower_bound(mode) - self.config.hysteresis_c {
            match mode.lower() {
                Some(next) => mode = next,
                None => break,
            }
        }
        mode
    }

    /// Forget the previously chosen mode.
    pub fn reset(&mut self) {
        self.last_mode = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(hysteresis_c: f64) -> ControlPolicy {
        ControlPolicy::new(PolicyConfig {
            hysteresis_c,
            ..PolicyConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn reference_table_lookup() {
        let mut p = policy(0.0);
        let d = p.decide(72.0);
        assert_eq!(d.mode, Mode::High);
        assert_eq!(d.actuation.burst_s, 0.7);
        assert_eq!(d.actuation.interval_s, 4.0);
        assert_eq!(d.actuation.fan_duty_pct, 50.0);
        assert!(d.actuation.tec_on);
        assert!(!d.purge);
    }

    #[test]
    fn stateless_without_hysteresis() {
        let mut p = policy(0.0);
        assert_eq!(p.decide(80.0).mode, Mode::Emergency);
        assert_eq!(p.decide(77.9).mode, Mode::High);
        assert_eq!(p.decide(60.0).mode, Mode::Active);
        assert_eq!(p.decide(59.999).mode, Mode::Idle);
    }

    #[test]
    fn upper_high_band_drives_emergency_actuation() {
        let mut p = policy(0.0);
        let below = p.decide(74.999);
        assert_eq!(below.mode, Mode::High);
        assert_eq!(below.actuation, ActuationTable::default().high);

        let at = p.decide(75.0);
        assert_eq!(at.mode, Mode::High);
        assert_eq!(at.actuation, ActuationTable::default().emergency);
        assert_eq!(at.actuation.fan_duty_pct, 100.0);
        assert_eq!(at.actuation.interval_s, 3.0);
    }

    #[test]
    fn purge_is_strictly_above_threshold() {
        let mut p = policy(0.0);
        assert!(!p.decide(85.0).purge);
        assert!(p.decide(85.01).purge);
    }

    #[test]
    fn hysteresis_holds_mode_on_the_way_down() {
        let mut p = policy(2.0);
        assert_eq!(p.decide(61.0).mode, Mode::Active);
        // Within the margin below 60: stays ACTIVE
        assert_eq!(p.decide(59.0).mode, Mode::Active);
        assert_eq!(p.decide(58.5).mode, Mode::Active);
        // Past the margin
        assert_eq!(p.decide(57.9).mode, Mode::Idle);
        // Rising is never delayed
        assert_eq!(p.decide(60.0).mode, Mode::Active);
    }

    #[test]
    fn hysteresis_can_drop_several_bands() {
        let mut p = policy(1.0);
        assert_eq!(p.decide(79.0).mode, Mode::Emergency);
        assert_eq!(p.decide(40.0).mode, Mode::Idle);
    }

    #[test]
    fn purge_threshold_must_exceed_emergency() {
        let cfg = PolicyConfig {
            purge_c: 75.0,
            ..PolicyConfig::default()
        };
        assert!(ControlPolicy::new(cfg).is_err());
    }

    #[test]
    fn negative_hysteresis_rejected() {
        let cfg = PolicyConfig {
            hysteresis_c: -1.0,
            ..PolicyConfig::default()
        };
        assert!(matches!(
            ControlPolicy::new(cfg),
            Err(ControlError::InvalidArg { .. })
        ));
    }
}
