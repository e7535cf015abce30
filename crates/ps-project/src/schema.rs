//! Project schema definitions.

use ps_controls::CommandProfile;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    /// Simulated seconds per tick.
    pub control_period_s: f64,
    /// Ticks per run.
    pub ticks: u64,
    /// Wall-clock seconds per tick. Defaults to `control_period_s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pacing_period_s: Option<f64>,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    pub plant: PlantDef,
    pub controller: ControllerDef,
    pub command: CommandDef,
    #[serde(default)]
    pub dependencies: Vec<DependencyDef>,
}

fn default_history_capacity() -> usize {
    1000
}

impl Project {
    pub fn pacing_period_s(&self) -> f64 {
        self.pacing_period_s.unwrap_or(self.control_period_s)
    }

    /// Sample key carrying the control force from controller to plant.
    pub fn control_key(&self) -> String {
        self.controller
            .output
            .clone()
            .unwrap_or_else(|| format!("{}_u", self.plant.name))
    }

    /// Names of the three modules, in registration order.
    pub fn module_names(&self) -> [&str; 3] {
        [
            self.controller.name.as_str(),
            self.command.name.as_str(),
            self.plant.name.as_str(),
        ]
    }
}

/// Cart-pole plant. Keys follow the conventional symbols of the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantDef {
    pub name: String,
    /// RK4 sub-steps per control period.
    #[serde(rename = "N")]
    pub substeps: usize,
    /// Pole angle (rad).
    pub x1_init: f64,
    /// Pole angular velocity (rad/s).
    pub x2_init: f64,
    /// Cart position (m).
    pub y1_init: f64,
    /// Cart velocity (m/s).
    pub y2_init: f64,
    pub y1_max: f64,
    pub y1_min: f64,
    /// Pole mass (kg).
    #[serde(rename = "m")]
    pub pole_mass_kg: f64,
    /// Cart mass (kg).
    #[serde(rename = "M")]
    pub cart_mass_kg: f64,
    /// Pole half-length (m).
    #[serde(rename = "l")]
    pub half_length_m: f64,
    /// Cart viscous damping (1/s).
    #[serde(rename = "K")]
    pub damping: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControllerDef {
    pub name: String,
    pub kp: f64,
    pub ti_s: f64,
    pub td_s: f64,
    pub td_filter_s: f64,
    pub out_min: f64,
    pub out_max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integral_limit: Option<f64>,
    /// Sample key of the measured variable.
    pub measurement: String,
    /// Sample key of the setpoint.
    pub setpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandDef {
    pub name: String,
    /// Sample key the command is published under.
    pub output: String,
    #[serde(default)]
    pub profile: CommandProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DependencyDef {
    pub consumer: String,
    pub producers: Vec<String>,
}

/// The stock stabilization loop: PID on pole angle, constant zero setpoint.
pub fn demo_project() -> Project {
    Project {
        version: crate::migrate::LATEST_VERSION,
        name: "cart-pole".to_string(),
        control_period_s: 0.01,
        ticks: 3000,
        pacing_period_s: Some(0.01),
        history_capacity: 1000,
        plant: PlantDef {
            name: "InvertedPendulum".to_string(),
            substeps: 10,
            x1_init: 0.1,
            x2_init: 0.0,
            y1_init: 0.0,
            y2_init: 0.0,
            y1_max: 5.0,
            y1_min: -5.0,
            pole_mass_kg: 0.1,
            cart_mass_kg: 1.0,
            half_length_m: 0.5,
            damping: 0.1,
        },
        controller: ControllerDef {
            name: "PID".to_string(),
            kp: -40.0,
            ti_s: 100.0,
            td_s: 0.1,
            td_filter_s: 0.01,
            out_min: -50.0,
            out_max: 50.0,
            integral_limit: None,
            measurement: "InvertedPendulum_theta".to_string(),
            setpoint: "command".to_string(),
            output: None,
        },
        command: CommandDef {
            name: "command".to_string(),
            output: "command".to_string(),
            profile: CommandProfile::Constant { value: 0.0 },
        },
        dependencies: vec![
            DependencyDef {
                consumer: "InvertedPendulum".to_string(),
                producers: vec!["PID".to_string()],
            },
            DependencyDef {
                consumer: "PID".to_string(),
                producers: vec!["command".to_string(), "InvertedPendulum".to_string()],
            },
        ],
    }
}
