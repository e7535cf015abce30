//! Open-loop plant runs and trajectory recording.

use crate::error::{SimError, SimResult};
use crate::plant::{CartPolePlant, PlantState};

/// Options for open-loop runs.
#[derive(Clone, Debug)]
pub struct OpenLoopOptions {
    /// Record every N-th control period (decimation)
    pub record_every: usize,
}

impl Default for OpenLoopOptions {
    fn default() -> Self {
        Self { record_every: 1 }
    }
}

/// Record of simulation results.
#[derive(Clone, Debug)]
pub struct SimRecord<S> {
    /// Time points (seconds)
    pub t: Vec<f64>,
    /// State snapshots
    pub x: Vec<S>,
}

impl<S> SimRecord<S> {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}

/// Drive a plant with a fixed input sequence, one entry per control period.
///
/// `None` entries leave the plant untouched, like a tick without a control
/// input. A numerical fault ends the run with that fault.
pub fn run_open_loop(
    plant: &mut CartPolePlant,
    inputs: &[Option<f64>],
    opts: &OpenLoopOptions,
) -> SimResult<SimRecord<PlantState>> {
    if opts.record_every == 0 {
        return Err(SimError::InvalidArg {
            what: "record_every must be positive",
        });
    }

    let period = plant.params().control_period;
    let mut t = 0.0;
    let mut t_record = vec![t];
    let mut x_record = vec![plant.current_state()];

    let mut step = 0;
    for &u in inputs {
        let x = plant.advance(u);
        if let Some(fault) = plant.take_fault() {
            return Err(fault);
        }
        step += 1;
        t = step as f64 * period;

        if step % opts.record_every == 0 {
            t_record.push(t);
            x_record.push(x);
        }
    }

    // Always record final state
    if step % opts.record_every != 0 {
        t_record.push(t);
        x_record.push(plant.current_state());
    }

    Ok(SimRecord {
        t: t_record,
        x: x_record,
    })
}
