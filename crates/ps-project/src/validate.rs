//! Project validation logic.

use crate::schema::{CommandDef, ControllerDef, PlantDef, Project};
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate name: {name} in {context}")]
    DuplicateName { name: String, context: String },

    #[error("Missing reference: {name} in {context}")]
    MissingReference { name: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    positive("control_period_s", project.control_period_s)?;
    if let Some(pacing) = project.pacing_period_s
        && (!pacing.is_finite() || pacing < 0.0)
    {
        return Err(invalid(
            "pacing_period_s",
            pacing,
            "must be non-negative and finite",
        ));
    }
    if project.history_capacity == 0 {
        return Err(invalid("history_capacity", 0, "must be at least 1"));
    }

    let mut names = HashSet::new();
    for name in project.module_names() {
        if name.is_empty() {
            return Err(invalid("module name", "\"\"", "must not be empty"));
        }
        if !names.insert(name) {
            return Err(ValidationError::DuplicateName {
                name: name.to_string(),
                context: "modules".to_string(),
            });
        }
    }

    validate_plant(&project.plant)?;
    validate_controller(&project.controller)?;
    validate_command(&project.command)?;

    let mut consumers = HashSet::new();
    for dep in &project.dependencies {
        if !names.contains(dep.consumer.as_str()) {
            return Err(ValidationError::MissingReference {
                name: dep.consumer.clone(),
                context: "dependency consumer".to_string(),
            });
        }
        if !consumers.insert(dep.consumer.as_str()) {
            return Err(ValidationError::DuplicateName {
                name: dep.consumer.clone(),
                context: "dependency consumers".to_string(),
            });
        }
        let mut producers = HashSet::new();
        for producer in &dep.producers {
            if !names.contains(producer.as_str()) {
                return Err(ValidationError::MissingReference {
                    name: producer.clone(),
                    context: format!("producers of '{}'", dep.consumer),
                });
            }
            if !producers.insert(producer.as_str()) {
                return Err(ValidationError::DuplicateName {
                    name: producer.clone(),
                    context: format!("producers of '{}'", dep.consumer),
                });
            }
        }
    }

    Ok(())
}

fn validate_plant(plant: &PlantDef) -> Result<(), ValidationError> {
    let field = |key: &str| format!("plant '{}' {}", plant.name, key);

    if plant.substeps == 0 {
        return Err(invalid(field("N"), 0, "must be at least 1"));
    }
    for (key, value) in [
        ("M", plant.cart_mass_kg),
        ("m", plant.pole_mass_kg),
        ("l", plant.half_length_m),
    ] {
        positive(&field(key), value)?;
    }
    if !plant.damping.is_finite() || plant.damping < 0.0 {
        return Err(invalid(
            field("K"),
            plant.damping,
            "must be non-negative and finite",
        ));
    }
    for (key, value) in [
        ("x1_init", plant.x1_init),
        ("x2_init", plant.x2_init),
        ("y1_init", plant.y1_init),
        ("y2_init", plant.y2_init),
        ("y1_min", plant.y1_min),
        ("y1_max", plant.y1_max),
    ] {
        if !value.is_finite() {
            return Err(invalid(field(key), value, "must be finite"));
        }
    }
    if plant.y1_min >= plant.y1_max {
        return Err(invalid(
            field("y1_min"),
            plant.y1_min,
            "must be less than y1_max",
        ));
    }
    if plant.y1_init < plant.y1_min || plant.y1_init > plant.y1_max {
        return Err(invalid(
            field("y1_init"),
            plant.y1_init,
            "must lie within [y1_min, y1_max]",
        ));
    }
    Ok(())
}

fn validate_controller(controller: &ControllerDef) -> Result<(), ValidationError> {
    let field = |key: &str| format!("controller '{}' {}", controller.name, key);

    if !controller.kp.is_finite() {
        return Err(invalid(field("kp"), controller.kp, "must be finite"));
    }
    positive(&field("ti_s"), controller.ti_s)?;
    if !controller.td_s.is_finite() || controller.td_s < 0.0 {
        return Err(invalid(
            field("td_s"),
            controller.td_s,
            "must be non-negative and finite",
        ));
    }
    positive(&field("td_filter_s"), controller.td_filter_s)?;
    if !controller.out_min.is_finite()
        || !controller.out_max.is_finite()
        || controller.out_min >= controller.out_max
    {
        return Err(invalid(
            field("out_min"),
            controller.out_min,
            "must be finite and less than out_max",
        ));
    }
    if let Some(limit) = controller.integral_limit
        && (!limit.is_finite() || limit < 0.0)
    {
        return Err(invalid(
            field("integral_limit"),
            limit,
            "must be non-negative and finite",
        ));
    }
    for (key, value) in [
        ("measurement", &controller.measurement),
        ("setpoint", &controller.setpoint),
    ] {
        if value.is_empty() {
            return Err(invalid(field(key), "\"\"", "must not be empty"));
        }
    }
    if controller.output.as_deref() == Some("") {
        return Err(invalid(field("output"), "\"\"", "must not be empty"));
    }
    Ok(())
}

fn validate_command(command: &CommandDef) -> Result<(), ValidationError> {
    if command.output.is_empty() {
        return Err(invalid(
            format!("command '{}' output", command.name),
            "\"\"",
            "must not be empty",
        ));
    }
    command
        .profile
        .validate()
        .map_err(|e| invalid(format!("command '{}' profile", command.name), e, "rejected"))
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive and finite"))
    }
}

fn invalid(
    field: impl Into<String>,
    value: impl std::fmt::Display,
    reason: &str,
) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
