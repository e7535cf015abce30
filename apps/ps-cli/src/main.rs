use clap::{Parser, Subcommand};
use ps_app::{AppResult, RunOptions, RunRequest, run_service};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ps-cli")]
#[command(about = "polesim CLI - PID-controlled cart-pole simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax and structure
    Validate {
        /// Path to the project YAML (or JSON) file
        project_path: PathBuf,
    },
    /// Run the control loop
    Run {
        /// Path to the project YAML (or JSON) file
        project_path: PathBuf,
        /// Number of ticks (defaults to the project's value)
        #[arg(long)]
        ticks: Option<u64>,
        /// Run as fast as possible instead of at the pacing period
        #[arg(long)]
        no_pacing: bool,
        /// Directory to write manifest.json and history.jsonl into
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Run {
            project_path,
            ticks,
            no_pacing,
            export,
        } => cmd_run(
            &project_path,
            RunOptions {
                ticks,
                no_pacing,
                export_dir: export,
            },
        ),
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = run_service::validate_file(project_path)?;
    println!("✓ Project is valid: {}", project.name);
    println!(
        "  {} ticks at {:.4} s, modules: {}",
        project.ticks,
        project.control_period_s,
        project.module_names().join(", ")
    );
    Ok(())
}

fn cmd_run(project_path: &Path, options: RunOptions) -> AppResult<()> {
    println!("Running project: {}", project_path.display());
    tracing::debug!(?options, "run options");

    let request = RunRequest {
        project_path,
        options,
    };
    let response = run_service::ensure_run(&request)?;
    let summary = &response.summary;

    println!("✓ Run completed: {}", response.run_name);
    println!("  Ticks: {}", summary.ticks);
    if summary.stopped {
        println!("  Stopped early");
    }
    println!("  Module faults: {}", summary.faults);
    println!("  Stale inputs: {}", summary.stale_inputs);
    println!("  Wall time: {:.3} s", summary.wall_time.as_secs_f64());

    println!("  Final plant state:");
    for sample in &response.final_plant {
        println!("    {:<28} {:>14.6}", sample.key, sample.value);
    }

    if let (Some(dir), Some(manifest)) = (&request.options.export_dir, &response.export) {
        println!(
            "  Exported {} to {} ({})",
            manifest.run_name,
            dir.display(),
            manifest.timestamp
        );
    }
    Ok(())
}
