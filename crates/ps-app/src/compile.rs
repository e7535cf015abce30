//! Project to runtime compilation.

use std::time::Duration;

use ps_controls::PIDController;
use ps_core::{kg, m, s};
use ps_project::{ControllerDef, PlantDef, Project};
use ps_runtime::{
    CommandModule, ControllerModule, ControllerWiring, DependencyScheduler, PlantModule,
    SchedulerOptions,
};
use ps_sim::{CartPolePlant, PlantParameters, PlantState, TrackBounds};

use crate::error::{AppError, AppResult};

/// A wired, idle scheduler plus what is needed to run it.
pub struct CompiledLoop {
    pub scheduler: DependencyScheduler,
    /// Registry name of the plant module.
    pub plant: String,
    pub ticks: u64,
    pub pacing: Duration,
}

pub fn build_plant(def: &PlantDef, control_period_s: f64) -> AppResult<CartPolePlant> {
    let bounds = TrackBounds::new(m(def.y1_min), m(def.y1_max))?;
    let params = PlantParameters::new(
        kg(def.cart_mass_kg),
        kg(def.pole_mass_kg),
        m(def.half_length_m),
        def.damping,
        def.substeps,
        s(control_period_s),
        bounds,
    )?;
    let initial = PlantState::new(def.x1_init, def.x2_init, def.y1_init, def.y2_init);
    Ok(CartPolePlant::new(params, initial)?)
}

pub fn build_controller(def: &ControllerDef) -> AppResult<PIDController> {
    let pid = PIDController::new(
        def.kp,
        def.ti_s,
        def.td_s,
        def.td_filter_s,
        def.out_min,
        def.out_max,
    )?;
    Ok(match def.integral_limit {
        Some(limit) => pid.with_integral_limit(limit),
        None => pid,
    })
}

/// Validate `project` and build its modules and wiring.
///
/// Modules register as controller, command source, plant.
pub fn compile_project(project: &Project) -> AppResult<CompiledLoop> {
    ps_project::validate_project(project)?;

    let mut scheduler = DependencyScheduler::new(SchedulerOptions {
        control_period_s: project.control_period_s,
        history_capacity: project.history_capacity,
    })?;

    let control_key = project.control_key();
    let controller = ControllerModule::new(
        project.controller.name.clone(),
        build_controller(&project.controller)?,
        ControllerWiring {
            setpoint_key: project.controller.setpoint.clone(),
            measurement_key: project.controller.measurement.clone(),
            output_key: control_key.clone(),
        },
        project.control_period_s,
    )?;
    let command = CommandModule::new(
        project.command.name.clone(),
        project.command.output.clone(),
        project.command.profile.clone(),
    );
    let plant = PlantModule::new(
        project.plant.name.clone(),
        build_plant(&project.plant, project.control_period_s)?,
    )
    .with_control_key(control_key);

    scheduler.register_module(Box::new(controller))?;
    scheduler.register_module(Box::new(command))?;
    scheduler.register_module(Box::new(plant))?;

    for dep in &project.dependencies {
        let producers: Vec<&str> = dep.producers.iter().map(String::as_str).collect();
        scheduler
            .declare_dependency(&dep.consumer, &producers)
            .map_err(|e| AppError::Compile(e.to_string()))?;
    }

    let pacing = Duration::try_from_secs_f64(project.pacing_period_s())
        .map_err(|e| AppError::Compile(format!("pacing period: {e}")))?;

    Ok(CompiledLoop {
        scheduler,
        plant: project.plant.name.clone(),
        ticks: project.ticks,
        pacing,
    })
}
