//! Command (setpoint) profiles.
//!
//! A profile is a pure function of simulated time. Command sources evaluate
//! it once per tick and publish the value as a sample.

use ps_core::ensure_finite;
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Setpoint as a function of time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CommandProfile {
    /// Fixed value.
    Constant { value: f64 },

    /// `initial` before `at_s`, `final_value` from `at_s` on.
    Step {
        initial: f64,
        final_value: f64,
        at_s: f64,
    },

    /// `offset + amplitude · sin(2π · frequency_hz · t)`.
    Sine {
        amplitude: f64,
        frequency_hz: f64,
        #[serde(default)]
        offset: f64,
    },

    /// `offset ± amplitude`, high for the first half of each period.
    Square {
        amplitude: f64,
        period_s: f64,
        #[serde(default)]
        offset: f64,
    },
}

impl CommandProfile {
    /// Check profile parameters.
    pub fn validate(&self) -> ControlResult<()> {
        match *self {
            CommandProfile::Constant { value } => {
                ensure_finite(value, "value")?;
                Ok(())
            }
            CommandProfile::Step {
                initial,
                final_value,
                at_s,
            } => {
                ensure_finite(initial, "initial")?;
                ensure_finite(final_value, "final_value")?;
                ensure_finite(at_s, "at_s")?;
                Ok(())
            }
            CommandProfile::Sine {
                amplitude,
                frequency_hz,
                offset,
            } => {
                ensure_finite(amplitude, "amplitude")?;
                ensure_finite(offset, "offset")?;
                if !frequency_hz.is_finite() || frequency_hz < 0.0 {
                    return Err(ControlError::InvalidArg {
                        what: "frequency_hz must be non-negative",
                    });
                }
                Ok(())
            }
            CommandProfile::Square {
                amplitude,
                period_s,
                offset,
            } => {
                ensure_finite(amplitude, "amplitude")?;
                ensure_finite(offset, "offset")?;
                if !period_s.is_finite() || period_s <= 0.0 {
                    return Err(ControlError::InvalidArg {
                        what: "period_s must be positive",
                    });
                }
                Ok(())
            }
        }
    }

    /// Evaluate the profile at simulated time `t_s`.
    pub fn value_at(&self, t_s: f64) -> f64 {
        match *self {
            CommandProfile::Constant { value } => value,
            CommandProfile::Step {
                initial,
                final_value,
                at_s,
            } => {
                if t_s < at_s {
                    initial
                } else {
                    final_value
                }
            }
            CommandProfile::Sine {
                amplitude,
                frequency_hz,
                offset,
            } => offset + amplitude * (std::f64::consts::TAU * frequency_hz * t_s).sin(),
            CommandProfile::Square {
                amplitude,
                period_s,
                offset,
            } => {
                let phase = t_s.rem_euclid(period_s);
                if phase < 0.5 * period_s {
                    offset + amplitude
                } else {
                    offset - amplitude
                }
            }
        }
    }
}

impl Default for CommandProfile {
    fn default() -> Self {
        CommandProfile::Constant { value: 0.0 }
    }
}
