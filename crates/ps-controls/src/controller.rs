//! PID controller for the cart-pole loop.
//!
//! Parallel form with integral and derivative times:
//!
//! ```text
//! u = kp · (e + (1/ti)·∫e dt + td · d(e_f)/dt),   e = sp − pv
//! ```
//!
//! `e_f` is the error passed through a first-order low-pass filter with
//! time constant `td_filter`. The output is clamped to `[out_min, out_max]`
//! and the integral is frozen while the output saturates. A negative `kp`
//! gives a reverse-acting loop.

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// PID controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PIDController {
    /// Proportional gain.
    pub kp: f64,
    /// Integral time constant (seconds).
    pub ti: f64,
    /// Derivative time constant (seconds).
    pub td: f64,
    /// Derivative filter time constant (seconds).
    pub td_filter: f64,
    /// Minimum output value.
    pub out_min: f64,
    /// Maximum output value.
    pub out_max: f64,
    /// Integral windup limit (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integral_limit: Option<f64>,
}

impl PIDController {
    /// Create a new PID controller.
    ///
    /// # Arguments
    ///
    /// * `kp` - Proportional gain (any finite sign)
    /// * `ti` - Integral time constant (seconds)
    /// * `td` - Derivative time constant (seconds)
    /// * `td_filter` - Derivative filter time constant (seconds)
    /// * `out_min` - Minimum output
    /// * `out_max` - Maximum output
    pub fn new(
        kp: f64,
        ti: f64,
        td: f64,
        td_filter: f64,
        out_min: f64,
        out_max: f64,
    ) -> ControlResult<Self> {
        if !kp.is_finite() {
            return Err(ControlError::InvalidArg {
                what: "kp must be finite",
            });
        }
        if ti.is_nan() || ti <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "ti must be positive",
            });
        }
        if !td.is_finite() || td < 0.0 {
            return Err(ControlError::InvalidArg {
                what: "td must be non-negative",
            });
        }
        if !td_filter.is_finite() || td_filter <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "td_filter must be positive",
            });
        }
        if out_min.is_nan() || out_max.is_nan() || out_min >= out_max {
            return Err(ControlError::InvalidArg {
                what: "out_min must be less than out_max",
            });
        }
        Ok(Self {
            kp,
            ti,
            td,
            td_filter,
            out_min,
            out_max,
            integral_limit: None,
        })
    }

    /// Set integral windup limit.
    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        self.integral_limit = Some(limit.abs());
        self
    }

    /// Compute controller output for one sample.
    ///
    /// The first call seeds the derivative filter with the current error so a
    /// nonzero initial error does not produce a derivative kick.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArg` if `dt` is not positive.
    pub fn update(
        &self,
        state: &PIDControllerState,
        pv: f64,
        sp: f64,
        dt: f64,
    ) -> ControlResult<(PIDControllerState, f64)> {
        if dt.is_nan() || dt <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "dt must be positive",
            });
        }

        let error = sp - pv;
        let p_term = self.kp * error;

        let ki = self.kp / self.ti;
        let new_integral = state.integral + error * dt;
        let clamped_integral = match self.integral_limit {
            Some(limit) => new_integral.clamp(-limit, limit),
            None => new_integral,
        };
        let i_term = ki * clamped_integral;

        // filt[n] = alpha * filt[n-1] + (1 - alpha) * error
        let previous_filtered = if state.initialized {
            state.filtered_error
        } else {
            error
        };
        let alpha = self.td_filter / (self.td_filter + dt);
        let filtered_error = alpha * previous_filtered + (1.0 - alpha) * error;
        let kd = self.kp * self.td;
        let d_term = kd * (filtered_error - previous_filtered) / dt;

        let output_raw = p_term + i_term + d_term;
        let output = output_raw.clamp(self.out_min, self.out_max);

        // Conditional integration: hold the integral while saturated.
        let final_integral = if output == output_raw {
            clamped_integral
        } else {
            state.integral
        };

        let new_state = PIDControllerState {
            integral: final_integral,
            filtered_error,
            initialized: true,
        };

        Ok((new_state, output))
    }
}

/// PID controller state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PIDControllerState {
    /// Integral accumulator.
    pub integral: f64,
    /// Filtered error for derivative calculation.
    pub filtered_error: f64,
    /// Whether the filter has been seeded.
    pub initialized: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pid() -> PIDController {
        PIDController::new(2.0, 1.0, 0.1, 0.01, -10.0, 10.0).unwrap()
    }

    #[test]
    fn pid_controller_creation() {
        let pid = PIDController::new(1.0, 2.0, 0.5, 0.1, 0.0, 1.0).unwrap();
        assert_eq!(pid.kp, 1.0);
        assert_eq!(pid.td, 0.5);
        assert_eq!(pid.integral_limit, None);
    }

    #[test]
    fn first_sample_has_no_derivative_kick() {
        let pid = pid();
        let (state, output) = pid
            .update(&PIDControllerState::default(), 0.0, 1.0, 0.01)
            .unwrap();
        // P = 2.0, I = 2.0 * 0.01 = 0.02, D = 0
        assert!((output - 2.02).abs() < 1e-12);
        assert!(state.initialized);
        assert_eq!(state.filtered_error, 1.0);
    }

    #[test]
    fn integral_accumulates_under_constant_error() {
        let pid = PIDController::new(1.0, 1.0, 0.0, 0.1, -10.0, 10.0).unwrap();
        let mut state = PIDControllerState::default();
        for _ in 0..10 {
            state = pid.update(&state, 0.0, 1.0, 0.1).unwrap().0;
        }
        assert!((state.integral - 1.0).abs() < 1e-12);
    }

    #[test]
    fn derivative_opposes_growing_measurement() {
        let pid = pid();
        let (state, _) = pid
            .update(&PIDControllerState::default(), 0.0, 0.0, 0.01)
            .unwrap();
        // PV jumps up: error becomes negative, derivative pushes output down.
        let (_, output) = pid.update(&state, 0.1, 0.0, 0.01).unwrap();
        assert!(output < 2.0 * -0.1);
    }

    #[test]
    fn output_clamped_and_integral_held() {
        let pid = pid();
        let state = PIDControllerState {
            integral: 0.5,
            filtered_error: 100.0,
            initialized: true,
        };
        let (next, output) = pid.update(&state, 0.0, 100.0, 0.01).unwrap();
        assert_eq!(output, 10.0);
        assert_eq!(next.integral, 0.5);
    }

    #[test]
    fn integral_limit_applied() {
        let pid = PIDController::new(0.001, 1.0, 0.0, 0.1, -10.0, 10.0)
            .unwrap()
            .with_integral_limit(0.2);
        let mut state = PIDControllerState::default();
        for _ in 0..100 {
            state = pid.update(&state, 0.0, 1.0, 0.1).unwrap().0;
        }
        assert_eq!(state.integral, 0.2);
    }

    #[test]
    fn reverse_acting_gain_allowed() {
        let pid = PIDController::new(-5.0, 10.0, 0.0, 0.1, -50.0, 50.0).unwrap();
        let (_, output) = pid
            .update(&PIDControllerState::default(), 0.1, 0.0, 0.01)
            .unwrap();
        assert!(output > 0.0);
    }

    #[test]
    fn invalid_controller_params() {
        assert!(PIDController::new(f64::NAN, 1.0, 0.0, 0.1, 0.0, 1.0).is_err());
        assert!(PIDController::new(1.0, -1.0, 0.0, 0.1, 0.0, 1.0).is_err());
        assert!(PIDController::new(1.0, 1.0, -0.5, 0.1, 0.0, 1.0).is_err());
        assert!(PIDController::new(1.0, 1.0, 0.5, 0.0, 0.0, 1.0).is_err());
        assert!(PIDController::new(1.0, 1.0, 0.5, 0.1, 1.0, 0.0).is_err());
        assert!(pid().update(&PIDControllerState::default(), 0.0, 0.0, 0.0).is_err());
    }

    proptest! {
        #[test]
        fn output_always_within_limits(
            pv in -1.0e3f64..1.0e3,
            sp in -1.0e3f64..1.0e3,
            integral in -1.0e3f64..1.0e3,
        ) {
            let pid = pid();
            let state = PIDControllerState { integral, filtered_error: 0.0, initialized: true };
            let (_, output) = pid.update(&state, pv, sp, 0.01).unwrap();
            prop_assert!((-10.0..=10.0).contains(&output));
        }
    }
}
