//! Tick-driven module runtime for polesim.
//!
//! Modules (plant, controller, command source) publish batches of named
//! samples. The [`DependencyScheduler`] wires them together by name and, once
//! per tick:
//!
//! 1. gathers the previous tick's outputs of each consumer's producers,
//! 2. delivers the concatenated batch as the consumer's new input,
//! 3. runs every module once,
//! 4. appends every published batch to the [`OutputHistory`].
//!
//! Because every module reads its producers' *previous* outputs, feedback
//! loops (controller ↔ plant) close through a one-tick delay and need no
//! evaluation order.

pub mod command_module;
pub mod controller_module;
pub mod error;
pub mod graph;
pub mod history;
pub mod module;
pub mod plant_module;
pub mod scheduler;

pub use command_module::CommandModule;
pub use controller_module::{ControllerModule, ControllerWiring};
pub use error::{ModuleError, ModuleResult, SchedulerError, SchedulerResult, SchedulerWarning};
pub use graph::{DependencyEdge, DependencyGraph};
pub use history::{HistoryEntry, HistoryHandle, OutputHistory};
pub use module::{Module, ModuleKind, TickContext};
pub use plant_module::PlantModule;
pub use scheduler::{
    DependencyScheduler, RunSummary, SchedulerOptions, SchedulerState, StopHandle, TickReport,
};
