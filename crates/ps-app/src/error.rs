//! Error types for the ps-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("Runtime compilation failed: {0}")]
    Compile(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Failed to export run to {path}: {message}")]
    Export { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ps-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<ps_project::ProjectError> for AppError {
    fn from(err: ps_project::ProjectError) -> Self {
        match err {
            ps_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<ps_project::ValidationError> for AppError {
    fn from(err: ps_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<ps_runtime::SchedulerError> for AppError {
    fn from(err: ps_runtime::SchedulerError) -> Self {
        AppError::Scheduler(err.to_string())
    }
}

impl From<ps_sim::SimError> for AppError {
    fn from(err: ps_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<ps_controls::ControlError> for AppError {
    fn from(err: ps_controls::ControlError) -> Self {
        AppError::Compile(err.to_string())
    }
}
