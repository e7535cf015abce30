//! Integration tests: scheduler wiring, ordering and stop semantics.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use ps_controls::{NamedSample, SampleBatch};
use ps_runtime::{
    DependencyScheduler, Module, ModuleError, ModuleKind, ModuleResult, SchedulerError,
    SchedulerOptions, SchedulerState, TickContext,
};

/// Appends `(name, tick, input keys)` to a shared log on every run.
struct Recorder {
    name: String,
    log: Arc<Mutex<Vec<(String, u64, Vec<String>)>>>,
    input: SampleBatch,
    output: Option<SampleBatch>,
}

impl Recorder {
    fn boxed(name: &str, log: &Arc<Mutex<Vec<(String, u64, Vec<String>)>>>) -> Box<dyn Module> {
        Box::new(Self {
            name: name.to_string(),
            log: Arc::clone(log),
            input: Vec::new(),
            output: None,
        })
    }
}

impl Module for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::Controller
    }

    fn update_input(&mut self, samples: SampleBatch) {
        self.input = samples;
    }

    fn run_once(&mut self, ctx: &TickContext) -> ModuleResult<()> {
        let keys = self.input.iter().map(|s| s.key.clone()).collect();
        self.log
            .lock()
            .unwrap()
            .push((self.name.clone(), ctx.tick, keys));
        self.output = Some(vec![NamedSample::new(
            format!("{}@{}", self.name, ctx.tick),
            ctx.time_s,
            ctx.tick as f64,
        )]);
        Ok(())
    }

    fn output(&self) -> Option<&[NamedSample]> {
        self.output.as_deref()
    }
}

/// Publishes the same key twice per tick.
struct Twin {
    output: Option<SampleBatch>,
}

impl Module for Twin {
    fn name(&self) -> &str {
        "twin"
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::CommandSource
    }

    fn update_input(&mut self, _samples: SampleBatch) {}

    fn run_once(&mut self, ctx: &TickContext) -> ModuleResult<()> {
        self.output = Some(vec![
            NamedSample::new("command", ctx.time_s, 1.0),
            NamedSample::new("command", ctx.time_s, 2.0),
        ]);
        Ok(())
    }

    fn output(&self) -> Option<&[NamedSample]> {
        self.output.as_deref()
    }
}

#[test]
fn modules_run_in_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut scheduler = DependencyScheduler::new(SchedulerOptions::default()).unwrap();
    for name in ["c", "a", "b"] {
        scheduler.register_module(Recorder::boxed(name, &log)).unwrap();
    }
    scheduler.run(Some(2), Duration::ZERO).unwrap();

    let order: Vec<(String, u64)> = log
        .lock()
        .unwrap()
        .iter()
        .map(|(name, tick, _)| (name.clone(), *tick))
        .collect();
    let expected: Vec<(String, u64)> = [
        ("c", 0),
        ("a", 0),
        ("b", 0),
        ("c", 1),
        ("a", 1),
        ("b", 1),
    ]
    .iter()
    .map(|(n, t)| (n.to_string(), *t))
    .collect();
    assert_eq!(order, expected);
}

#[test]
fn input_is_concatenated_in_producer_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut scheduler = DependencyScheduler::new(SchedulerOptions::default()).unwrap();
    for name in ["sink", "p1", "p2"] {
        scheduler.register_module(Recorder::boxed(name, &log)).unwrap();
    }
    scheduler.declare_dependency("sink", &["p2", "p1"]).unwrap();
    scheduler.run(Some(3), Duration::ZERO).unwrap();

    let log = log.lock().unwrap();
    let sink: Vec<&Vec<String>> = log
        .iter()
        .filter(|(name, _, _)| name == "sink")
        .map(|(_, _, keys)| keys)
        .collect();
    assert!(sink[0].is_empty());
    // The sink never sees its producers' output from the same tick.
    assert_eq!(sink[1], &vec!["p2@0".to_string(), "p1@0".to_string()]);
    assert_eq!(sink[2], &vec!["p2@1".to_string(), "p1@1".to_string()]);
}

#[test]
fn wiring_errors_are_configuration_errors() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut scheduler = DependencyScheduler::new(SchedulerOptions::default()).unwrap();
    scheduler.register_module(Recorder::boxed("a", &log)).unwrap();
    scheduler.register_module(Recorder::boxed("b", &log)).unwrap();

    let dup = scheduler.register_module(Recorder::boxed("a", &log));
    assert!(matches!(dup, Err(SchedulerError::Configuration { .. })));
    let unknown = scheduler.declare_dependency("a", &["ghost"]);
    assert!(matches!(unknown, Err(SchedulerError::Configuration { .. })));

    scheduler.declare_dependency("a", &["b"]).unwrap();
    let twice = scheduler.declare_dependency("a", &["b"]);
    assert!(matches!(twice, Err(SchedulerError::Configuration { .. })));

    assert_eq!(scheduler.graph().modules(), ["a", "b"]);
    assert_eq!(scheduler.graph().edges().len(), 1);
    assert!(scheduler.module("b").is_some());
    assert!(scheduler.module("ghost").is_none());
}

#[test]
fn stop_from_another_thread_ends_unbounded_run() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut scheduler = DependencyScheduler::new(SchedulerOptions::default()).unwrap();
    scheduler.register_module(Recorder::boxed("a", &log)).unwrap();

    let stop = scheduler.stop_handle();
    let history = scheduler.history();
    let stopper = thread::spawn(move || {
        while history.read().len("a") < 5 {
            thread::sleep(Duration::from_millis(1));
        }
        stop.request_stop();
    });

    let summary = scheduler.run(None, Duration::from_millis(1)).unwrap();
    stopper.join().unwrap();

    assert!(summary.stopped);
    assert!(summary.ticks >= 5);
    assert_eq!(summary.ticks, scheduler.tick_count());
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert!(scheduler.tick().is_err());
}

#[test]
fn history_is_readable_while_running() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let options = SchedulerOptions {
        control_period_s: 0.5,
        history_capacity: 4,
    };
    let mut scheduler = DependencyScheduler::new(options).unwrap();
    scheduler.register_module(Recorder::boxed("a", &log)).unwrap();
    scheduler.run(Some(10), Duration::ZERO).unwrap();

    let snapshot = scheduler.history().snapshot();
    let ticks: Vec<u64> = snapshot.batches("a").iter().map(|e| e.tick).collect();
    assert_eq!(ticks, vec![6, 7, 8, 9]);
    assert_eq!(snapshot.last("a").unwrap().samples[0].timestamp_s, 4.5);
}

#[test]
fn duplicate_output_keys_are_reported_as_faults() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut scheduler = DependencyScheduler::new(SchedulerOptions::default()).unwrap();
    scheduler
        .register_module(Box::new(Twin { output: None }))
        .unwrap();
    scheduler.register_module(Recorder::boxed("a", &log)).unwrap();
    scheduler.start().unwrap();

    let report = scheduler.tick().unwrap();
    assert_eq!(
        report.faults,
        vec![ModuleError::DuplicateKey {
            module: "twin".to_string(),
            key: "command".to_string(),
        }]
    );
    assert_eq!(report.faults[0].module(), "twin");

    // The fault is isolated: the other module still ran.
    assert_eq!(log.lock().unwrap().len(), 1);
    let summary = scheduler.run(Some(3), Duration::ZERO).unwrap();
    assert_eq!(summary.faults, 3);
}
