//! Canister cooling simulation engine.
//!
//! Provides:
//! - Lumped thermal node with forward Euler integration
//! - Finite gas canisters and battery with gapless switchover
//! - Gas microbursts, emergency purge and afterglow
//! - Derated TEC with runtime and hot-side protection
//! - Fan multiplier with duty ramp and post-purge boost
//! - Mission phases, energy ledger and PASS/FAIL verdict

pub mod engine;
pub mod error;
pub mod fan;
pub mod gas;
pub mod guard;
pub mod passive;
pub mod phases;
pub mod record;
pub mod resources;
pub mod tec;
pub mod thermal;
pub mod workload;

pub use engine::{Engine, simulate};
pub use error::{SimError, SimResult};
pub use fan::{Fan, FanState};
pub use gas::{AfterglowTimer, BurstTimer, GasOutput, GasSystem};
pub use guard::{Instability, NumericalGuard, truncation_bound_c};
pub use passive::Passive;
pub use phases::{Gate, PhasePlan};
pub use record::{
    Contributions, EventKind, Ledger, RunSummary, SimEvent, SimOutput, TickRecord, Verdict,
};
pub use resources::{Canister, ResourceEvent, ResourcePool};
pub use tec::{Tec, TecOutput, TecShutdown, TecState};
pub use thermal::ThermalState;
pub use workload::Workload;

/// Version tag folded into run ids so cached results are invalidated when
/// the engine changes.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
