//! Module wrapper around a command profile.

use ps_controls::{CommandProfile, NamedSample, SampleBatch};

use crate::error::ModuleResult;
use crate::module::{Module, ModuleKind, TickContext};

/// Publishes `[<output_key>]`, the profile evaluated at the tick time.
pub struct CommandModule {
    name: String,
    output_key: String,
    profile: CommandProfile,
    output: Option<SampleBatch>,
}

impl CommandModule {
    pub fn new(
        name: impl Into<String>,
        output_key: impl Into<String>,
        profile: CommandProfile,
    ) -> Self {
        Self {
            name: name.into(),
            output_key: output_key.into(),
            profile,
            output: None,
        }
    }

    pub fn profile(&self) -> &CommandProfile {
        &self.profile
    }
}

impl Module for CommandModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::CommandSource
    }

    fn update_input(&mut self, _samples: SampleBatch) {
        // Command sources have no inputs.
    }

    fn run_once(&mut self, ctx: &TickContext) -> ModuleResult<()> {
        let value = self.profile.value_at(ctx.time_s);
        self.output = Some(vec![NamedSample::new(
            self.output_key.clone(),
            ctx.time_s,
            value,
        )]);
        Ok(())
    }

    fn output(&self) -> Option<&[NamedSample]> {
        self.output.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_profile() {
        let profile = CommandProfile::Step {
            initial: 0.0,
            final_value: 0.2,
            at_s: 0.045,
        };
        let mut command = CommandModule::new("command", "command", profile);
        assert!(command.output().is_none());

        command.run_once(&TickContext::new(4, 0.01)).unwrap();
        assert_eq!(command.output().unwrap()[0].value, 0.0);

        command.run_once(&TickContext::new(5, 0.01)).unwrap();
        let out = command.output().unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, "command");
        assert_eq!(out[0].value, 0.2);
    }
}
