//! Error types for control operations.

use thiserror::Error;

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while building or running a control policy.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Mode thresholds are not strictly ascending.
    #[error("Thresholds out of order: {what}")]
    ThresholdOrder { what: String },

    /// An actuation table entry is not physically realizable.
    #[error("Invalid actuation for {mode}: {what}")]
    InvalidActuation { mode: String, what: &'static str },
}

impl From<cc_core::CcError> for ControlError {
    fn from(e: cc_core::CcError) -> Self {
        match e {
            cc_core::CcError::NonFinite { what, .. }
            | cc_core::CcError::OutOfRange { what, .. }
            | cc_core::CcError::InvalidArg { what } => ControlError::InvalidArg { what },
        }
    }
}
