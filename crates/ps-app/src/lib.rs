//! Shared application service layer for polesim.
//!
//! Turns a project file into a wired scheduler, runs it, and exports the
//! recorded history. Used by the CLI.

pub mod compile;
pub mod error;
pub mod export;
pub mod run_service;

pub use compile::{CompiledLoop, build_controller, build_plant, compile_project};
pub use error::{AppError, AppResult};
pub use export::{
    ExportManifest, TickRecord, export_history, history_records, load_export_manifest,
    load_history,
};
pub use run_service::{RunOptions, RunRequest, RunResponse, ensure_run, run_project, validate_file};
