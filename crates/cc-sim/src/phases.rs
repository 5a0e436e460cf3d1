//! Mission phases: time slices with per-mechanism gating.

use cc_project::PhaseDef;
use serde::{Deserialize, Serialize};

/// Which mechanisms may run during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    pub gas: bool,
    pub tec: bool,
    pub fan: bool,
}

impl Gate {
    pub const ALL: Gate = Gate {
        gas: true,
        tec: true,
        fan: true,
    };
}

#[derive(Debug, Clone)]
struct Phase {
    name: String,
    start_s: f64,
    gate: Gate,
}

/// Ordered phase list. The last phase persists past its nominal end.
#[derive(Debug, Clone, Default)]
pub struct PhasePlan {
    phases: Vec<Phase>,
}

impl PhasePlan {
    pub fn new(defs: &[PhaseDef]) -> Self {
        let mut start_s = 0.0;
        let phases = defs
            .iter()
            .map(|d| {
                let phase = Phase {
                    name: d.name.clone(),
                    start_s,
                    gate: Gate {
                        gas: d.gas,
                        tec: d.tec,
                        fan: d.fan,
                    },
                };
                start_s += d.duration_s;
                phase
            })
            .collect();
        Self { phases }
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Index of the phase covering `t`.
    pub fn index_at(&self, t: f64) -> Option<usize> {
        if self.phases.is_empty() {
            return None;
        }
        let after = self.phases.iter().take_while(|p| p.start_s <= t).count();
        Some(after.saturating_sub(1))
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.phases.get(index).map(|p| p.name.as_str())
    }

    pub fn gate_at(&self, t: f64) -> Gate {
        self.index_at(t)
            .and_then(|i| self.phases.get(i))
            .map_or(Gate::ALL, |p| p.gate)
    }
}
