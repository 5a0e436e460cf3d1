//! Fan duty ramp.
//!
//! A fan cannot jump between duty settings. The ramp moves the duty toward the
//! commanded value at a fixed rate in each direction:
//! - `ramp_up_s`: seconds for a full 0 → 100 % swing
//! - `ramp_down_s`: seconds for a full 100 → 0 % swing
//!
//! A zero ramp time makes that direction instantaneous.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};

/// Rate-limited duty actuator.
///
/// # Example
///
/// ```
/// use cc_controls::DutyRamp;
///
/// let ramp = DutyRamp::new(50.0, 100.0).unwrap();
/// // 5 s at 2 %/s
/// assert_eq!(ramp.step(0.0, 100.0, 5.0), 10.0);
/// // 5 s at 1 %/s
/// assert_eq!(ramp.step(30.0, 0.0, 5.0), 25.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DutyRamp {
    pub ramp_up_s: f64,
    pub ramp_down_s: f64,
}

impl DutyRamp {
    pub fn new(ramp_up_s: f64, ramp_down_s: f64) -> ControlResult<Self> {
        if !(ramp_up_s.is_finite() && ramp_up_s >= 0.0) {
            return Err(ControlError::InvalidArg {
                what: "ramp_up_s must be non-negative and finite",
            });
        }
        if !(ramp_down_s.is_finite() && ramp_down_s >= 0.0) {
            return Err(ControlError::InvalidArg {
                what: "ramp_down_s must be non-negative and finite",
            });
        }
        Ok(Self {
            ramp_up_s,
            ramp_down_s,
        })
    }

    fn max_delta(ramp_s: f64, dt: f64) -> f64 {
        if ramp_s <= 0.0 {
            f64::INFINITY
        } else {
            100.0 * dt / ramp_s
        }
    }

    /// Advance `current` toward `target` over `dt` seconds.
    ///
    /// The result never overshoots the target and stays within 0..=100.
    pub fn step(&self, current: f64, target: f64, dt: f64) -> f64 {
        let target = target.clamp(0.0, 100.0);
        let next = if target > current {
            target.min(current + Self::max_delta(self.ramp_up_s, dt))
        } else {
            target.max(current - Self::max_delta(self.ramp_down_s, dt))
        };
        next.clamp(0.0, 100.0)
    }

    /// Seconds to move from `from` to `to`.
    pub fn time_to_reach(&self, from: f64, to: f64) -> f64 {
        let span = (to - from).abs() / 100.0;
        if to >= from {
            span * self.ramp_up_s
        } else {
            span * self.ramp_down_s
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramps_up_at_configured_rate() {
        let ramp = DutyRamp::new(50.0, 100.0).unwrap();
        let mut duty = 0.0;
        for _ in 0..5 {
            duty = ramp.step(duty, 100.0, 5.0);
        }
        assert!((duty - 50.0).abs() < 1e-12);
    }

    #[test]
    fn never_overshoots() {
        let ramp = DutyRamp::new(10.0, 10.0).unwrap();
        assert_eq!(ramp.step(25.0, 30.0, 5.0), 30.0);
        assert_eq!(ramp.step(35.0, 30.0, 5.0), 30.0);
    }

    #[test]
    fn zero_ramp_is_instant() {
        let ramp = DutyRamp::new(0.0, 0.0).unwrap();
        assert_eq!(ramp.step(0.0, 100.0, 0.1), 100.0);
        assert_eq!(ramp.step(100.0, 0.0, 0.1), 0.0);
    }

    #[test]
    fn time_to_reach_full_swing() {
        let ramp = DutyRamp::new(50.0, 100.0).unwrap();
        assert_eq!(ramp.time_to_reach(0.0, 100.0), 50.0);
        assert_eq!(ramp.time_to_reach(100.0, 50.0), 50.0);
    }

    #[test]
    fn invalid_parameters() {
        assert!(DutyRamp::new(-1.0, 1.0).is_err());
        assert!(DutyRamp::new(1.0, f64::NAN).is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn step_stays_in_range_and_moves_toward_target(
                current in 0.0f64..=100.0,
                target in 0.0f64..=100.0,
                up in 0.0f64..200.0,
                down in 0.0f64..200.0,
                dt in 0.01f64..30.0,
            ) {
                let ramp = DutyRamp::new(up, down).unwrap();
                let next = ramp.step(current, target, dt);
                prop_assert!((0.0..=100.0).contains(&next));
                prop_assert!((target - next).abs() <= (target - current).abs() + 1e-9);
            }
        }
    }
}
