//! cc-core: shared foundation for the canister cooling simulator.
//!
//! Contains:
//! - units (uom SI types and the power-over-time conversion)
//! - numeric (tolerances and float helpers)
//! - error (shared error type)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{CcError, CcResult};
pub use numeric::*;
pub use units::*;
