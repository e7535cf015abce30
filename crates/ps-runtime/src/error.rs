//! Error types for the module runtime.

use ps_controls::ControlError;
use ps_sim::SimError;
use thiserror::Error;

use crate::scheduler::SchedulerState;

pub type SchedulerResult<T> = Result<T, SchedulerError>;
pub type ModuleResult<T> = Result<T, ModuleError>;

/// Fatal scheduler errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchedulerError {
    /// Wiring refers to unknown modules, or options are invalid.
    #[error("Configuration error: {what}")]
    Configuration { what: String },

    #[error("Invalid scheduler state: expected {expected:?}, found {actual:?}")]
    InvalidState {
        expected: SchedulerState,
        actual: SchedulerState,
    },
}

/// Errors raised by a single module during `run_once`.
///
/// These never abort a tick; the scheduler records them and moves on.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModuleError {
    #[error("Numerical fault in module '{module}': {source}")]
    NumericalFault {
        module: String,
        #[source]
        source: SimError,
    },

    #[error("Control error in module '{module}': {source}")]
    Control {
        module: String,
        #[source]
        source: ControlError,
    },

    /// The published batch carries the same key more than once.
    #[error("Module '{module}' published duplicate key '{key}'")]
    DuplicateKey { module: String, key: String },
}

impl ModuleError {
    /// Name of the module that raised the error.
    pub fn module(&self) -> &str {
        match self {
            ModuleError::NumericalFault { module, .. }
            | ModuleError::Control { module, .. }
            | ModuleError::DuplicateKey { module, .. } => module,
        }
    }
}

/// Non-fatal conditions observed during a tick.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerWarning {
    /// None of the consumer's producers has published yet; the consumer runs
    /// with its previous input (or none).
    #[error("Stale input for '{consumer}': no upstream output available")]
    StaleInput { consumer: String },
}
