//! Module wrapper around the cart-pole plant.

use ps_controls::{NamedSample, SampleBatch, find_sample};
use ps_sim::{CartPolePlant, PlantState};

use crate::error::{ModuleError, ModuleResult};
use crate::module::{Module, ModuleKind, TickContext};

/// Publishes `<name>_theta`, `<name>_dtheta`, `<name>_y`, `<name>_dy` every
/// tick and reads its force from the `<name>_u` sample (configurable).
pub struct PlantModule {
    name: String,
    control_key: String,
    output_keys: [String; 4],
    plant: CartPolePlant,
    input: Option<SampleBatch>,
    output: Option<SampleBatch>,
}

impl PlantModule {
    pub fn new(name: impl Into<String>, plant: CartPolePlant) -> Self {
        let name = name.into();
        let output_keys = ["theta", "dtheta", "y", "dy"].map(|suffix| format!("{name}_{suffix}"));
        Self {
            control_key: format!("{name}_u"),
            name,
            output_keys,
            plant,
            input: None,
            output: None,
        }
    }

    /// Read the control force from a different sample key.
    pub fn with_control_key(mut self, key: impl Into<String>) -> Self {
        self.control_key = key.into();
        self
    }

    pub fn control_key(&self) -> &str {
        &self.control_key
    }

    /// Output keys in emission order.
    pub fn output_keys(&self) -> &[String; 4] {
        &self.output_keys
    }

    pub fn plant(&self) -> &CartPolePlant {
        &self.plant
    }

    pub fn state(&self) -> PlantState {
        self.plant.current_state()
    }

    fn control_input(&self) -> Option<f64> {
        let input = self.input.as_deref()?;
        find_sample(input, &self.control_key).map(|s| s.value)
    }
}

impl Module for PlantModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::Plant
    }

    fn update_input(&mut self, samples: SampleBatch) {
        self.input = Some(samples);
    }

    fn run_once(&mut self, ctx: &TickContext) -> ModuleResult<()> {
        let state = self.plant.advance(self.control_input());

        let values = state.to_array();
        let batch = self
            .output_keys
            .iter()
            .zip(values)
            .map(|(key, value)| NamedSample::new(key.clone(), ctx.time_s, value))
            .collect();
        self.output = Some(batch);

        match self.plant.take_fault() {
            Some(source) => Err(ModuleError::NumericalFault {
                module: self.name.clone(),
                source,
            }),
            None => Ok(()),
        }
    }

    fn output(&self) -> Option<&[NamedSample]> {
        self.output.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_core::{kg, m, s};
    use ps_sim::{PlantParameters, TrackBounds};

    fn module() -> PlantModule {
        let bounds = TrackBounds::new(m(-1.0), m(1.0)).unwrap();
        let params =
            PlantParameters::new(kg(1.0), kg(0.1), m(0.5), 0.1, 10, s(0.01), bounds).unwrap();
        let plant = CartPolePlant::new(params, PlantState::new(0.1, 0.0, 0.0, 0.0)).unwrap();
        PlantModule::new("InvertedPendulum", plant)
    }

    #[test]
    fn publishes_state_in_fixed_order() {
        let mut plant = module();
        plant.run_once(&TickContext::new(0, 0.01)).unwrap();

        let out = plant.output().unwrap();
        let keys: Vec<&str> = out.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(
            keys,
            [
                "InvertedPendulum_theta",
                "InvertedPendulum_dtheta",
                "InvertedPendulum_y",
                "InvertedPendulum_dy"
            ]
        );
        // No input yet: published state is the initial state.
        assert_eq!(out[0].value, 0.1);
        assert_eq!(out[2].value, 0.0);
    }

    #[test]
    fn ignores_batches_without_control_key() {
        let mut plant = module();
        plant.update_input(vec![NamedSample::new("PID_error", 0.0, 3.0)]);
        plant.run_once(&TickContext::new(0, 0.01)).unwrap();
        assert_eq!(plant.state().theta(), 0.1);
    }

    #[test]
    fn advances_with_control_input() {
        let mut plant = module();
        plant.update_input(vec![NamedSample::new("InvertedPendulum_u", 0.0, 5.0)]);
        plant.run_once(&TickContext::new(1, 0.01)).unwrap();

        assert!(plant.state().y() > 0.0);
        let out = plant.output().unwrap();
        assert!(out.iter().all(|s| s.timestamp_s == 0.01));
    }

    #[test]
    fn last_input_reused_until_replaced() {
        let mut plant = module();
        plant.update_input(vec![NamedSample::new("InvertedPendulum_u", 0.0, 5.0)]);
        plant.run_once(&TickContext::new(0, 0.01)).unwrap();
        let y1 = plant.state().y();
        plant.run_once(&TickContext::new(1, 0.01)).unwrap();
        assert!(plant.state().y() > y1);
    }

    #[test]
    fn custom_control_key() {
        let mut plant = module().with_control_key("force");
        assert_eq!(plant.control_key(), "force");
        plant.update_input(vec![NamedSample::new("force", 0.0, -5.0)]);
        plant.run_once(&TickContext::new(0, 0.01)).unwrap();
        assert!(plant.state().y() < 0.0);
    }

    #[test]
    fn numerical_fault_reported_once() {
        let mut plant = module();
        plant.update_input(vec![NamedSample::new("InvertedPendulum_u", 0.0, f64::NAN)]);

        let err = plant.run_once(&TickContext::new(0, 0.01)).unwrap_err();
        assert!(matches!(err, ModuleError::NumericalFault { .. }));
        assert_eq!(err.module(), "InvertedPendulum");
        // Output still published (frozen state).
        assert_eq!(plant.output().unwrap()[0].value, 0.1);

        assert!(plant.run_once(&TickContext::new(1, 0.01)).is_ok());
        assert!(plant.plant().is_frozen());
    }
}
