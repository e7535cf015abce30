//! Fixed-period dependency scheduler.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use ps_controls::{NamedSample, SampleBatch, first_duplicate_key};
use tracing::{debug, error, info, trace};

use crate::error::{ModuleError, SchedulerError, SchedulerResult, SchedulerWarning};
use crate::graph::DependencyGraph;
use crate::history::HistoryHandle;
use crate::module::{Module, TickContext};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerOptions {
    /// Simulated seconds per tick.
    pub control_period_s: f64,
    /// Entries retained per module in the output history.
    pub history_capacity: usize,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            control_period_s: 0.01,
            history_capacity: 1000,
        }
    }
}

impl SchedulerOptions {
    pub fn validate(&self) -> SchedulerResult<()> {
        ps_core::ensure_positive(self.control_period_s, "control_period_s").map_err(|e| {
            SchedulerError::Configuration {
                what: e.to_string(),
            }
        })?;
        if self.history_capacity == 0 {
            return Err(SchedulerError::Configuration {
                what: "history_capacity must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Cloneable stop request, safe to trigger from any thread.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub time_s: f64,
    /// Consumers that received a new input batch.
    pub delivered: usize,
    pub warnings: Vec<SchedulerWarning>,
    pub faults: Vec<ModuleError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    /// True when a stop request ended the run before the tick limit.
    pub stopped: bool,
    pub faults: usize,
    pub stale_inputs: usize,
    pub wall_time: Duration,
}

/// Runs registered modules once per tick, feeding each consumer the previous
/// tick's outputs of its producers.
pub struct DependencyScheduler {
    options: SchedulerOptions,
    state: SchedulerState,
    modules: Vec<Box<dyn Module>>,
    graph: DependencyGraph,
    /// `(consumer, producers)` as registry indices, in declaration order.
    wiring: Vec<(usize, Vec<usize>)>,
    history: HistoryHandle,
    stop: StopHandle,
    tick: u64,
}

impl DependencyScheduler {
    pub fn new(options: SchedulerOptions) -> SchedulerResult<Self> {
        options.validate()?;
        Ok(Self {
            history: HistoryHandle::new(options.history_capacity),
            options,
            state: SchedulerState::Idle,
            modules: Vec::new(),
            graph: DependencyGraph::new(),
            wiring: Vec::new(),
            stop: StopHandle::default(),
            tick: 0,
        })
    }

    /// Share `stop` with the caller, so a request made through it ends `run`.
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn history(&self) -> HistoryHandle {
        self.history.clone()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn module(&self, name: &str) -> Option<&dyn Module> {
        let idx = self.graph.index_of(name)?;
        self.modules.get(idx).map(|m| m.as_ref())
    }

    pub fn latest_output(&self, name: &str) -> Option<&[NamedSample]> {
        self.module(name).and_then(|m| m.output())
    }

    pub fn register_module(&mut self, module: Box<dyn Module>) -> SchedulerResult<()> {
        self.expect_state(SchedulerState::Idle)?;
        self.graph.add_module(module.name())?;
        debug!(module = module.name(), kind = ?module.kind(), "registered module");
        self.modules.push(module);
        Ok(())
    }

    /// Declare that `consumer` reads the outputs of `producers`, in order.
    pub fn declare_dependency(
        &mut self,
        consumer: &str,
        producers: &[&str],
    ) -> SchedulerResult<()> {
        self.expect_state(SchedulerState::Idle)?;
        let resolved = self.graph.declare(consumer, producers)?;
        self.wiring.push(resolved);
        Ok(())
    }

    pub fn start(&mut self) -> SchedulerResult<()> {
        self.expect_state(SchedulerState::Idle)?;
        self.state = SchedulerState::Running;
        info!(
            modules = self.modules.len(),
            dependencies = self.wiring.len(),
            feedback = !self.graph.is_acyclic(),
            control_period_s = self.options.control_period_s,
            "scheduler started"
        );
        Ok(())
    }

    /// Stop for good. Idempotent. The shared stop flag is left untouched.
    pub fn stop(&mut self) {
        if self.state != SchedulerState::Stopped {
            self.state = SchedulerState::Stopped;
            info!(ticks = self.tick, "scheduler stopped");
        }
    }

    /// Execute one tick.
    pub fn tick(&mut self) -> SchedulerResult<TickReport> {
        self.expect_state(SchedulerState::Running)?;
        let tick = self.tick;
        let ctx = TickContext::new(tick, self.options.control_period_s);
        let mut report = TickReport {
            tick,
            time_s: ctx.time_s,
            delivered: 0,
            warnings: Vec::new(),
            faults: Vec::new(),
        };

        // Every batch is built before any module runs.
        let deliveries: Vec<(usize, SampleBatch)> = self
            .wiring
            .iter()
            .map(|(consumer, producers)| {
                let batch = producers
                    .iter()
                    .filter_map(|&p| self.modules[p].output())
                    .flat_map(|out| out.iter().cloned())
                    .collect();
                (*consumer, batch)
            })
            .collect();

        for (consumer, batch) in deliveries {
            let module = &mut self.modules[consumer];
            if batch.is_empty() {
                debug!(tick, consumer = module.name(), "stale input");
                report.warnings.push(SchedulerWarning::StaleInput {
                    consumer: module.name().to_string(),
                });
            } else {
                module.update_input(batch);
                report.delivered += 1;
            }
        }

        for module in &mut self.modules {
            let result = module.run_once(&ctx).and_then(|()| {
                match module.output().and_then(first_duplicate_key) {
                    Some(key) => Err(ModuleError::DuplicateKey {
                        module: module.name().to_string(),
                        key: key.to_string(),
                    }),
                    None => Ok(()),
                }
            });
            if let Err(err) = result {
                error!(tick, module = module.name(), error = %err, "module fault");
                report.faults.push(err);
            }
        }

        {
            let mut history = self.history.write();
            for module in &self.modules {
                if let Some(out) = module.output() {
                    history.record(module.name(), tick, out);
                }
            }
        }

        self.tick += 1;
        Ok(report)
    }

    /// Tick `ticks` times, or until stopped when `None`, sleeping so each
    /// tick takes about `period`. A zero period runs as fast as possible.
    ///
    /// Starts the scheduler if it is idle.
    pub fn run(&mut self, ticks: Option<u64>, period: Duration) -> SchedulerResult<RunSummary> {
        if self.state == SchedulerState::Idle {
            self.start()?;
        }
        self.expect_state(SchedulerState::Running)?;

        let started = Instant::now();
        let mut summary = RunSummary {
            ticks: 0,
            stopped: false,
            faults: 0,
            stale_inputs: 0,
            wall_time: Duration::ZERO,
        };

        loop {
            if ticks.is_some_and(|limit| summary.ticks >= limit) {
                break;
            }
            if self.stop.is_stop_requested() {
                summary.stopped = true;
                break;
            }

            let tick_started = Instant::now();
            let report = self.tick()?;
            summary.ticks += 1;
            summary.faults += report.faults.len();
            summary.stale_inputs += report.warnings.len();

            if ticks.is_some_and(|limit| summary.ticks >= limit) {
                break;
            }
            if self.stop.is_stop_requested() {
                summary.stopped = true;
                break;
            }

            if !period.is_zero() {
                let busy = tick_started.elapsed();
                match period.checked_sub(busy) {
                    Some(rest) => thread::sleep(rest),
                    None => trace!(
                        tick = report.tick,
                        busy_s = busy.as_secs_f64(),
                        "tick overran period"
                    ),
                }
            }
        }

        if summary.stopped {
            self.stop();
        }
        summary.wall_time = started.elapsed();
        info!(
            ticks = summary.ticks,
            stopped = summary.stopped,
            faults = summary.faults,
            wall_time_s = summary.wall_time.as_secs_f64(),
            "run finished"
        );
        Ok(summary)
    }

    fn expect_state(&self, expected: SchedulerState) -> SchedulerResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SchedulerError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }
}
