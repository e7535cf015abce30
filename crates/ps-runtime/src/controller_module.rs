//! Module wrapper around the PID controller.

use ps_controls::{
    ControlError, NamedSample, PIDController, PIDControllerState, SampleBatch, find_sample,
};

use crate::error::{ModuleError, ModuleResult};
use crate::module::{Module, ModuleKind, TickContext};

/// Sample keys a controller reads and writes.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerWiring {
    /// Key of the setpoint sample (from the command source).
    pub setpoint_key: String,
    /// Key of the measured process variable (from the plant).
    pub measurement_key: String,
    /// Key the control output is published under (read by the plant).
    pub output_key: String,
}

/// Publishes `[<output_key>, <name>_error]` whenever both the setpoint and the
/// measurement are present in its input. Otherwise the previous output stays.
pub struct ControllerModule {
    name: String,
    wiring: ControllerWiring,
    error_key: String,
    controller: PIDController,
    state: PIDControllerState,
    dt: f64,
    input: Option<SampleBatch>,
    output: Option<SampleBatch>,
}

impl ControllerModule {
    /// Create a controller module sampling every `dt` seconds.
    pub fn new(
        name: impl Into<String>,
        controller: PIDController,
        wiring: ControllerWiring,
        dt: f64,
    ) -> Result<Self, ControlError> {
        if dt.is_nan() || dt <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "controller dt must be positive",
            });
        }
        let name = name.into();
        Ok(Self {
            error_key: format!("{name}_error"),
            name,
            wiring,
            controller,
            state: PIDControllerState::default(),
            dt,
            input: None,
            output: None,
        })
    }

    pub fn wiring(&self) -> &ControllerWiring {
        &self.wiring
    }

    pub fn controller_state(&self) -> &PIDControllerState {
        &self.state
    }
}

impl Module for ControllerModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::Controller
    }

    fn update_input(&mut self, samples: SampleBatch) {
        self.input = Some(samples);
    }

    fn run_once(&mut self, ctx: &TickContext) -> ModuleResult<()> {
        let Some(input) = self.input.as_deref() else {
            return Ok(());
        };
        let setpoint = find_sample(input, &self.wiring.setpoint_key);
        let measurement = find_sample(input, &self.wiring.measurement_key);
        let (Some(sp), Some(pv)) = (setpoint, measurement) else {
            return Ok(());
        };
        let (sp, pv) = (sp.value, pv.value);

        let (state, u) = self
            .controller
            .update(&self.state, pv, sp, self.dt)
            .map_err(|source| ModuleError::Control {
                module: self.name.clone(),
                source,
            })?;
        self.state = state;

        self.output = Some(vec![
            NamedSample::new(self.wiring.output_key.clone(), ctx.time_s, u),
            NamedSample::new(self.error_key.clone(), ctx.time_s, sp - pv),
        ]);
        Ok(())
    }

    fn output(&self) -> Option<&[NamedSample]> {
        self.output.as_deref()
    }
}
