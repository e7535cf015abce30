//! Error types for control operations.

use thiserror::Error;

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in control operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

impl From<ps_core::CoreError> for ControlError {
    fn from(e: ps_core::CoreError) -> Self {
        match e {
            ps_core::CoreError::NonFinite { what, .. }
            | ps_core::CoreError::InvalidArg { what }
            | ps_core::CoreError::Invariant { what } => ControlError::InvalidArg { what },
        }
    }
}
