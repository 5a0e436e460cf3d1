//! Error types for simulation operations.

use thiserror::Error;

/// Errors that stop a simulation from being built.
///
/// Nothing that happens during a run is an error: depletion, exceedance and
/// numerical trouble are recorded as events instead.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] cc_project::ValidationError),

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Control policy error: {0}")]
    Control(#[from] cc_controls::ControlError),
}

pub type SimResult<T> = Result<T, SimError>;

impl From<cc_core::CcError> for SimError {
    fn from(e: cc_core::CcError) -> Self {
        match e {
            cc_core::CcError::NonFinite { what, .. }
            | cc_core::CcError::OutOfRange { what, .. }
            | cc_core::CcError::InvalidArg { what } => SimError::InvalidArg { what },
        }
    }
}
