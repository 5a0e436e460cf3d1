//! Finite gas canisters and battery.
//!
//! Draws are clamped to what is left. Running dry is not an error: the pool
//! queues a [`ResourceEvent`] and later draws return zero.

use crate::error::{SimError, SimResult};
use cc_core::{ensure_positive, percent_of};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canister {
    pub capacity_j: f64,
    pub remaining_j: f64,
}

impl Canister {
    pub fn full(capacity_j: f64) -> Self {
        Self {
            capacity_j,
            remaining_j: capacity_j,
        }
    }
}

/// Depletion and switchover signals, drained by the simulation loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResourceEvent {
    CanisterDepleted { index: usize },
    CanisterSwitched { from: usize, to: usize },
    GasExhausted,
    BatteryDepleted,
}

#[derive(Debug, Clone)]
pub struct ResourcePool {
    canisters: Vec<Canister>,
    active_index: usize,
    battery_remaining_wh: f64,
    battery_initial_wh: f64,
    battery_capacity_wh: f64,
    battery_reported: bool,
    pending: Vec<ResourceEvent>,
}

fn requested(amount: f64) -> Option<f64> {
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

impl ResourcePool {
    pub fn new(
        canister_capacities_j: &[f64],
        battery_capacity_wh: f64,
        battery_initial_wh: f64,
    ) -> SimResult<Self> {
        if canister_capacities_j.is_empty() {
            return Err(SimError::InvalidArg {
                what: "at least one canister is required",
            });
        }
        let canisters = canister_capacities_j
            .iter()
            .map(|&c| ensure_positive(c, "canister capacity").map(Canister::full))
            .collect::<Result<Vec<_>, _>>()?;
        if !(battery_capacity_wh.is_finite() && battery_capacity_wh >= 0.0) {
            return Err(SimError::InvalidArg {
                what: "battery capacity must be non-negative",
            });
        }
        if !(0.0..=battery_capacity_wh).contains(&battery_initial_wh) {
            return Err(SimError::InvalidArg {
                what: "battery charge must be within capacity",
            });
        }
        Ok(Self {
            canisters,
            active_index: 0,
            battery_remaining_wh: battery_initial_wh,
            battery_initial_wh,
            battery_capacity_wh,
            battery_reported: false,
            pending: Vec::new(),
        })
    }

    /// Take up to `energy_j` from the active canister.
    ///
    /// Emptying the canister advances to the next one, so the following call
    /// is served by it.
    pub fn draw_gas(&mut self, energy_j: f64) -> f64 {
        let Some(want) = requested(energy_j) else {
            return 0.0;
        };
        let index = self.active_index;
        let Some(canister) = self.canisters.get_mut(index) else {
            return 0.0;
        };
        let taken = want.min(canister.remaining_j);
        canister.remaining_j -= taken;
        if canister.remaining_j <= 0.0 {
            canister.remaining_j = 0.0;
            self.active_index += 1;
            self.pending.push(ResourceEvent::CanisterDepleted { index });
            if self.active_index < self.canisters.len() {
                self.pending.push(ResourceEvent::CanisterSwitched {
                    from: index,
                    to: self.active_index,
                });
            } else {
                self.pending.push(ResourceEvent::GasExhausted);
            }
        }
        taken
    }

    /// Take up to `energy_j`, continuing into the next canisters when the
    /// active one runs dry.
    pub fn draw_gas_spanning(&mut self, energy_j: f64) -> f64 {
        let Some(want) = requested(energy_j) else {
            return 0.0;
        };
        let mut taken = self.draw_gas(want);
        for _ in 0..self.canisters.len() {
            if taken >= want || self.gas_exhausted() {
                break;
            }
            taken += self.draw_gas(want - taken);
        }
        taken
    }

    /// Take up to `energy_wh` from the battery.
    pub fn draw_battery(&mut self, energy_wh: f64) -> f64 {
        let Some(want) = requested(energy_wh) else {
            return 0.0;
        };
        let taken = want.min(self.battery_remaining_wh);
        self.battery_remaining_wh -= taken;
        if self.battery_remaining_wh <= 0.0 {
            self.battery_remaining_wh = 0.0;
            if !self.battery_reported {
                self.battery_reported = true;
                self.pending.push(ResourceEvent::BatteryDepleted);
            }
        }
        taken
    }

    pub fn take_events(&mut self) -> Vec<ResourceEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn canisters(&self) -> &[Canister] {
        &self.canisters
    }

    /// Index of the canister serving draws; equals the canister count once
    /// all are empty.
    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active_canister(&self) -> Option<&Canister> {
        self.canisters.get(self.active_index)
    }

    pub fn gas_exhausted(&self) -> bool {
        self.active_index >= self.canisters.len()
    }

    pub fn gas_remaining_j(&self) -> f64 {
        self.canisters.iter().map(|c| c.remaining_j).sum()
    }

    pub fn gas_capacity_j(&self) -> f64 {
        self.canisters.iter().map(|c| c.capacity_j).sum()
    }

    pub fn gas_used_pct(&self) -> f64 {
        let capacity = self.gas_capacity_j();
        percent_of(capacity - self.gas_remaining_j(), capacity)
    }

    pub fn battery_has_charge(&self) -> bool {
        self.battery_remaining_wh > 0.0
    }

    pub fn battery_remaining_wh(&self) -> f64 {
        self.battery_remaining_wh
    }

    pub fn battery_capacity_wh(&self) -> f64 {
        self.battery_capacity_wh
    }

    /// Share of the starting charge consumed.
    pub fn battery_used_pct(&self) -> f64 {
        percent_of(
            self.battery_initial_wh - self.battery_remaining_wh,
            self.battery_initial_wh,
        )
    }
}
