//! Adaptive cooling control for the canister cooling simulator.
//!
//! The control domain is a temperature-driven state machine. Each sample the
//! policy maps the die temperature to a discrete [`Mode`], and each mode maps
//! to an [`Actuation`] tuple (microburst length, burst interval, fan duty, TEC
//! request). A separate, higher threshold requests an emergency purge.
//!
//! # Architecture
//!
//! - [`ControlPolicy`] holds the thresholds and the actuation table
//! - [`DutyRamp`] models the fan's finite spin-up and spin-down rate
//! - [`SampleClock`] and [`ZeroOrderHold`] give sampled/digital semantics
//! - [`FirmwareController`] drives valve and PWM registers from the same table
//!
//! The simulator and the firmware emulation share one decision table so the
//! two can be cross-validated.

pub mod error;
pub mod firmware;
pub mod mode;
pub mod policy;
pub mod ramp;
pub mod sampled;

pub use error::{ControlError, ControlResult};
pub use firmware::{FirmwareController, RegisterFrame, SensorReadings};
pub use mode::{Actuation, ActuationTable, Mode, ModeThresholds};
pub use policy::{ControlPolicy, Decision, PolicyConfig};
pub use ramp::DutyRamp;
pub use sampled::{SampleClock, SampleConfig, ZeroOrderHold};
