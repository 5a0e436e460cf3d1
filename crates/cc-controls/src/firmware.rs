//! Firmware control task emulation.
//!
//! The embedded controller samples two temperature sensors at a fixed update
//! rate, runs the same [`ControlPolicy`] as the simulator and writes a
//! [`RegisterFrame`]: two gas solenoids (microburst and purge) and 8-bit PWM
//! channels for the TEC and the fan. Everything here is a pure function of
//! the sample time and the sensor readings, so frames can be compared
//! against the simulator's decisions directly.

use crate::mode::{Actuation, Mode};
use crate::policy::{ControlPolicy, Decision};
use crate::sampled::{SampleConfig, ZeroOrderHold, next_after};
use serde::{Deserialize, Serialize};

pub const PWM_MAX: u8 = u8::MAX;

/// One sample of the two board sensors (°C).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    pub die_c: f64,
    pub enclosure_c: f64,
}

impl SensorReadings {
    /// Temperature the policy acts on: the hotter of the two sensors.
    pub fn control_temp_c(&self) -> f64 {
        self.die_c.max(self.enclosure_c)
    }
}

/// Output register state written by the control task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegisterFrame {
    pub burst_valve_open: bool,
    pub purge_valve_open: bool,
    pub tec_pwm: u8,
    pub fan_pwm: u8,
}

/// Convert a duty percentage to an 8-bit PWM compare value.
pub fn duty_to_pwm(duty_pct: f64) -> u8 {
    let scaled = (duty_pct.clamp(0.0, 100.0) / 100.0 * f64::from(PWM_MAX)).round();
    scaled as u8
}

/// Convert an 8-bit PWM compare value back to a duty percentage.
pub fn pwm_to_duty(pwm: u8) -> f64 {
    f64::from(pwm) / f64::from(PWM_MAX) * 100.0
}

impl RegisterFrame {
    /// Steady-state channels for an actuation, valves closed.
    pub fn for_actuation(actuation: &Actuation) -> Self {
        Self {
            burst_valve_open: false,
            purge_valve_open: false,
            tec_pwm: if actuation.tec_on { PWM_MAX } else { 0 },
            fan_pwm: duty_to_pwm(actuation.fan_duty_pct),
        }
    }

    /// Fan duty (%) and TEC request encoded in this frame.
    pub fn decode(&self) -> (f64, bool) {
        (pwm_to_duty(self.fan_pwm), self.tec_pwm > 0)
    }
}

/// Periodic control task with held outputs.
#[derive(Debug, Clone)]
pub struct FirmwareController {
    policy: ControlPolicy,
    hold: ZeroOrderHold<RegisterFrame>,
    last_decision: Option<Decision>,
    next_burst_at: f64,
    burst_until: f64,
}

impl FirmwareController {
    pub fn new(policy: ControlPolicy, sample: SampleConfig) -> Self {
        Self {
            policy,
            hold: ZeroOrderHold::new(sample, 0.0, RegisterFrame::default()),
            last_decision: None,
            next_burst_at: 0.0,
            burst_until: f64::NEG_INFINITY,
        }
    }

    pub fn last_mode(&self) -> Option<Mode> {
        self.last_decision.map(|d| d.mode)
    }

    /// Run the control task at `now_s`. Returns the frame on the output
    /// registers, which only changes on sample boundaries.
    pub fn tick(&mut self, now_s: f64, sensors: SensorReadings) -> RegisterFrame {
        let policy = &mut self.policy;
        let next_burst_at = &mut self.next_burst_at;
        let burst_until = &mut self.burst_until;
        let last_decision = &mut self.last_decision;
        self.hold.update_with(now_s, || {
            let decision = policy.decide(sensors.control_temp_c());
            let act = decision.actuation;
            if now_s >= *next_burst_at {
                *burst_until = now_s + act.burst_s;
                *next_burst_at = next_after(*next_burst_at, now_s, act.interval_s);
            }
            *last_decision = Some(decision);
            RegisterFrame {
                burst_valve_open: act.burst_s > 0.0 && now_s < *burst_until,
                purge_valve_open: decision.purge,
                ..RegisterFrame::for_actuation(&act)
            }
        });
        *self.hold.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyConfig;

    fn controller(rate_hz: f64) -> FirmwareController {
        let policy = ControlPolicy::new(PolicyConfig::default()).unwrap();
        FirmwareController::new(policy, SampleConfig::from_frequency(rate_hz).unwrap())
    }

    #[test]
    fn pwm_encoding_round_trips_within_one_count() {
        for duty in [0.0, 30.0, 50.0, 100.0] {
            let back = pwm_to_duty(duty_to_pwm(duty));
            assert!((back - duty).abs() <= 100.0 / 255.0);
        }
        assert_eq!(duty_to_pwm(100.0), 255);
        assert_eq!(duty_to_pwm(150.0), 255);
        assert_eq!(duty_to_pwm(0.0), 0);
    }

    #[test]
    fn hotter_sensor_drives_the_policy() {
        let mut fw = controller(10.0);
        let frame = fw.tick(
            0.0,
            SensorReadings {
                die_c: 55.0,
                enclosure_c: 71.0,
            },
        );
        assert_eq!(fw.last_mode(), Some(Mode::High));
        assert_eq!(frame.tec_pwm, PWM_MAX);
        assert_eq!(frame.fan_pwm, duty_to_pwm(50.0));
    }

    #[test]
    fn outputs_hold_between_samples() {
        let mut fw = controller(1.0);
        let cool = SensorReadings {
            die_c: 40.0,
            enclosure_c: 35.0,
        };
        let hot = SensorReadings {
            die_c: 90.0,
            enclosure_c: 40.0,
        };
        let first = fw.tick(0.0, cool);
        let held = fw.tick(0.5, hot);
        assert_eq!(first.fan_pwm, held.fan_pwm);
        assert!(!held.purge_valve_open);
        let next = fw.tick(1.0, hot);
        assert!(next.purge_valve_open);
        assert_eq!(next.fan_pwm, PWM_MAX);
    }

    #[test]
    fn burst_valve_follows_interval() {
        let mut fw = controller(10.0);
        let warm = SensorReadings {
            die_c: 65.0,
            enclosure_c: 30.0,
        };
        // ACTIVE: 0.5 s open every 5 s
        assert!(fw.tick(0.0, warm).burst_valve_open);
        assert!(fw.tick(0.4, warm).burst_valve_open);
        assert!(!fw.tick(0.6, warm).burst_valve_open);
        assert!(!fw.tick(4.9, warm).burst_valve_open);
        assert!(fw.tick(5.0, warm).burst_valve_open);
    }

    #[test]
    fn late_sample_skips_missed_bursts_in_one_step() {
        let mut fw = controller(10.0);
        let warm = SensorReadings {
            die_c: 65.0,
            enclosure_c: 30.0,
        };
        assert!(fw.tick(0.0, warm).burst_valve_open);
        // a day later: one burst now, the next on the 5 s grid
        assert!(fw.tick(86_400.0, warm).burst_valve_open);
        assert!(!fw.tick(86_401.0, warm).burst_valve_open);
        assert!(fw.tick(86_405.0, warm).burst_valve_open);
    }
}
