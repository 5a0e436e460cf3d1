//! Passive dissipation.

use cc_project::{AmbientSwing, PassiveDef};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Passive {
    Constant { watts: f64 },
    Ambient { w_per_c: f64, def: PassiveDef },
}

impl From<&PassiveDef> for Passive {
    fn from(def: &PassiveDef) -> Self {
        match *def {
            PassiveDef::Constant { watts } => Passive::Constant { watts },
            PassiveDef::Ambient { w_per_c, .. } => Passive::Ambient { w_per_c, def: *def },
        }
    }
}

impl Passive {
    /// Heat shed at `temp_c` at mission time `t_s`, never negative.
    pub fn power_w(&self, temp_c: f64, t_s: f64) -> f64 {
        match self {
            Passive::Constant { watts } => *watts,
            Passive::Ambient { w_per_c, def } => {
                let ambient_c = def.ambient_at(t_s).unwrap_or(temp_c);
                w_per_c * (temp_c - ambient_c).max(0.0)
            }
        }
    }

    /// Upper bound on dissipation up to `temp_c`, over the whole ambient cycle.
    pub fn peak_power_w(&self, temp_c: f64) -> f64 {
        match self {
            Passive::Constant { watts } => *watts,
            Passive::Ambient { w_per_c, def } => {
                let coolest = def.ambient_min().unwrap_or(temp_c);
                w_per_c * (temp_c - coolest).max(0.0)
            }
        }
    }
}
