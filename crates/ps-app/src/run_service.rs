//! Run execution service.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ps_controls::NamedSample;
use ps_project::Project;
use ps_runtime::{RunSummary, StopHandle};

use crate::compile::compile_project;
use crate::error::AppResult;
use crate::export::{ExportManifest, export_history};

/// Options for running a project.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides the project's tick count.
    pub ticks: Option<u64>,
    /// Run as fast as possible instead of at the pacing period.
    pub no_pacing: bool,
    /// Write `manifest.json` and `history.jsonl` here after the run.
    pub export_dir: Option<PathBuf>,
}

/// Request to load and execute a project file.
pub struct RunRequest<'a> {
    pub project_path: &'a Path,
    pub options: RunOptions,
}

#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_name: String,
    pub summary: RunSummary,
    /// Last published plant batch.
    pub final_plant: Vec<NamedSample>,
    pub export: Option<ExportManifest>,
}

/// Load and validate a project file (`.json` or YAML).
pub fn validate_file(path: &Path) -> AppResult<Project> {
    Ok(ps_project::load(path)?)
}

/// Load the requested project and run it.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    let project = validate_file(request.project_path)?;
    run_project(&project, &request.options, None)
}

/// Compile and run `project`. When `stop` is given, a stop requested through
/// it also ends the run.
pub fn run_project(
    project: &Project,
    options: &RunOptions,
    stop: Option<&StopHandle>,
) -> AppResult<RunResponse> {
    let compiled = compile_project(project)?;
    let mut scheduler = match stop {
        Some(stop) => compiled.scheduler.with_stop_handle(stop.clone()),
        None => compiled.scheduler,
    };
    let ticks = options.ticks.unwrap_or(compiled.ticks);
    let pacing = if options.no_pacing {
        Duration::ZERO
    } else {
        compiled.pacing
    };

    tracing::info!(
        project = %project.name,
        ticks,
        pacing_s = pacing.as_secs_f64(),
        "starting run"
    );
    let summary = scheduler.run(Some(ticks), pacing)?;
    scheduler.stop();

    let final_plant = scheduler
        .latest_output(&compiled.plant)
        .map(<[NamedSample]>::to_vec)
        .unwrap_or_default();

    let export = match &options.export_dir {
        Some(dir) => {
            let history = scheduler.history();
            let history = history.read();
            Some(export_history(
                dir,
                &project.name,
                summary.ticks,
                project.control_period_s,
                &history,
            )?)
        }
        None => None,
    };

    if summary.faults > 0 {
        tracing::warn!(faults = summary.faults, "run finished with module faults");
    }

    Ok(RunResponse {
        run_name: project.name.clone(),
        summary,
        final_plant,
        export,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_project::demo_project;

    #[test]
    fn short_unpaced_run() {
        let options = RunOptions {
            ticks: Some(20),
            no_pacing: true,
            export_dir: None,
        };
        let response = run_project(&demo_project(), &options, None).unwrap();
        assert_eq!(response.summary.ticks, 20);
        assert!(!response.summary.stopped);
        assert_eq!(response.summary.faults, 0);
        assert_eq!(response.final_plant.len(), 4);
        assert_eq!(response.final_plant[0].key, "InvertedPendulum_theta");
        assert!(response.export.is_none());
    }

    #[test]
    fn stop_requested_up_front_runs_no_ticks() {
        let stop = StopHandle::default();
        stop.request_stop();
        let options = RunOptions {
            ticks: Some(1_000_000),
            no_pacing: false,
            export_dir: None,
        };
        let response = run_project(&demo_project(), &options, Some(&stop)).unwrap();
        assert!(response.summary.stopped);
        assert_eq!(response.summary.ticks, 0);
        assert!(response.final_plant.is_empty());
    }

    #[test]
    fn external_stop_ends_paced_run() {
        let stop = StopHandle::default();
        let stopper = {
            let stop = stop.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(50));
                stop.request_stop();
            })
        };
        let options = RunOptions {
            ticks: Some(1_000_000),
            no_pacing: false,
            export_dir: None,
        };
        let response = run_project(&demo_project(), &options, Some(&stop)).unwrap();
        stopper.join().unwrap();
        assert!(response.summary.stopped);
        assert!(response.summary.ticks > 0);
        assert!(response.summary.ticks < 1_000_000);
    }

    #[test]
    fn completed_run_leaves_caller_stop_unset() {
        let stop = StopHandle::default();
        let options = RunOptions {
            ticks: Some(5),
            no_pacing: true,
            export_dir: None,
        };
        let response = run_project(&demo_project(), &options, Some(&stop)).unwrap();
        assert_eq!(response.summary.ticks, 5);
        assert!(!response.summary.stopped);
        assert!(!stop.is_stop_requested());
    }
}
