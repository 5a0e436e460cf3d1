//! Sampled execution primitives.
//!
//! Firmware runs its control task at a fixed update rate. Between samples the
//! last register frame is held (zero-order hold). The simulator itself samples
//! the policy once per tick and does not need a clock.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};

/// Sample period of a periodic control task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Sample period in seconds.
    pub dt: f64,
}

impl SampleConfig {
    pub fn new(dt: f64) -> ControlResult<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "sample period must be positive",
            });
        }
        Ok(Self { dt })
    }

    /// Create a sample configuration from an update rate in Hz.
    pub fn from_frequency(freq_hz: f64) -> ControlResult<Self> {
        if !(freq_hz.is_finite() && freq_hz > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "update rate must be positive",
            });
        }
        Ok(Self { dt: 1.0 / freq_hz })
    }

    pub fn frequency(&self) -> f64 {
        1.0 / self.dt
    }
}

/// First point of the grid `start + k·period` strictly after `now`.
/// Returns `start` unchanged when it is already in the future.
pub(crate) fn next_after(start: f64, now: f64, period: f64) -> f64 {
    if start > now {
        return start;
    }
    let mut next = start + (((now - start) / period).floor() + 1.0) * period;
    if next <= now {
        next += period;
    }
    next
}

/// Tracks when the next sample is due.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleClock {
    pub config: SampleConfig,
    pub next_sample_time: f64,
}

impl SampleClock {
    /// Clock whose first sample is due immediately at `initial_time`.
    pub fn new(config: SampleConfig, initial_time: f64) -> Self {
        Self {
            config,
            next_sample_time: initial_time,
        }
    }

    pub fn should_sample(&self, current_time: f64) -> bool {
        current_time >= self.next_sample_time
    }

    /// Advance past `current_time`, skipping any samples missed in between.
    pub fn advance(&mut self, current_time: f64) {
        self.next_sample_time = next_after(self.next_sample_time, current_time, self.config.dt);
    }

    pub fn time_until_sample(&self, current_time: f64) -> f64 {
        (self.next_sample_time - current_time).max(0.0)
    }
}

/// Holds the last sampled value between samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroOrderHold<T> {
    pub value: T,
    pub clock: SampleClock,
}

impl<T: Clone> ZeroOrderHold<T> {
    pub fn new(config: SampleConfig, initial_time: f64, initial_value: T) -> Self {
        Self {
            value: initial_value,
            clock: SampleClock::new(config, initial_time),
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Recompute the held value with `sample` if a sample is due.
    ///
    /// Returns `true` if the value was updated.
    pub fn update_with(&mut self, current_time: f64, sample: impl FnOnce() -> T) -> bool {
        if self.clock.should_sample(current_time) {
            self.value = sample();
            self.clock.advance(current_time);
            true
        } else {
            false
        }
    }
}
