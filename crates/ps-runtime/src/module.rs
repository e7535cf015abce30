//! The contract every scheduled participant satisfies.

use ps_controls::{NamedSample, SampleBatch};

use crate::error::ModuleResult;

/// Role of a module in the loop. The scheduler does not branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Plant,
    Controller,
    CommandSource,
}

/// Tick index and the simulated time it stands for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub tick: u64,
    pub time_s: f64,
}

impl TickContext {
    pub fn new(tick: u64, control_period_s: f64) -> Self {
        Self {
            tick,
            time_s: tick as f64 * control_period_s,
        }
    }
}

/// A periodically executed participant.
///
/// Outputs are published by replacement: `run_once` builds a complete new
/// batch and swaps it in, so `output` never exposes a half-built batch.
pub trait Module: Send {
    /// Registry name, unique within a scheduler.
    fn name(&self) -> &str;

    fn kind(&self) -> ModuleKind;

    /// Replace the current input batch wholesale.
    fn update_input(&mut self, samples: SampleBatch);

    /// Advance one tick using the current input batch, if any.
    ///
    /// Must be safe to call when no new input arrived since the last call.
    fn run_once(&mut self, ctx: &TickContext) -> ModuleResult<()>;

    /// Most recently published batch.
    fn output(&self) -> Option<&[NamedSample]>;
}
