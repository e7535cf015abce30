//! Error types for simulation operations.

use ps_core::CoreError;
use thiserror::Error;

/// Errors encountered during plant simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Numerical fault in {what}: value = {value}")]
    NumericalFault { what: &'static str, value: f64 },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<CoreError> for SimError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::NonFinite { what, value } => SimError::NumericalFault { what, value },
            CoreError::InvalidArg { what } => SimError::InvalidArg { what },
            CoreError::Invariant { .. } => SimError::Backend {
                message: e.to_string(),
            },
        }
    }
}
