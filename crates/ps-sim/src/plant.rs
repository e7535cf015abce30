//! Cart-pole (inverted pendulum) plant with saturation mode switching.
//!
//! State `[θ, θ̇, y, ẏ]`:
//! - θ: pole rotation (rad), clockwise positive
//! - θ̇: pole angular rate (rad/s)
//! - y: cart translation (m), limited to the track bounds
//! - ẏ: cart velocity (m/s)
//!
//! Input `u` is the translation force on the cart (N).
//!
//! ## Dynamics
//!
//! With `a = 1/(m+M)` the plant switches between two laws:
//!
//! ```text
//! Normal:
//!   θ̈ = (g·sin θ − l·θ − a·m·l·θ̇²·sin(2θ)/2 − a·cos θ·u) / (4/3·l − a·m·l·cos²θ)
//!   ÿ = a·(u + m·l·sin θ·θ̇² − m·l·cos θ·θ̈ − K·ẏ)
//!
//! Saturated (cart pushed into a track end stop):
//!   θ̈ = (g·sin θ − l·θ) / (4/3·l)
//!   ẏ = 0, ÿ = 0
//! ```
//!
//! The mode is selected on every derivative evaluation, so each RK4 stage
//! checks the predicate against its own stage state.

use nalgebra::Vector4;
use ps_core::constants::G_MPS2;
use ps_core::{
    Length, Mass, Time, ensure_finite, ensure_non_negative, ensure_positive, in_kg, in_m, in_s,
};

use crate::error::{SimError, SimResult};
use crate::integrator::{Integrator, RK4};
use crate::model::TransientModel;

const STATE_NAMES: [&str; 4] = ["theta", "theta_dot", "y", "y_dot"];
const DERIVATIVE_NAMES: [&str; 4] = ["dtheta/dt", "d2theta/dt2", "dy/dt", "d2y/dt2"];

/// Plant state vector `[θ, θ̇, y, ẏ]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlantState {
    pub x: Vector4<f64>,
}

impl PlantState {
    pub fn new(theta: f64, theta_dot: f64, y: f64, y_dot: f64) -> Self {
        Self {
            x: Vector4::new(theta, theta_dot, y, y_dot),
        }
    }

    pub fn zeros() -> Self {
        Self {
            x: Vector4::zeros(),
        }
    }

    pub fn theta(&self) -> f64 {
        self.x[0]
    }

    pub fn theta_dot(&self) -> f64 {
        self.x[1]
    }

    pub fn y(&self) -> f64 {
        self.x[2]
    }

    pub fn y_dot(&self) -> f64 {
        self.x[3]
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.x[0], self.x[1], self.x[2], self.x[3]]
    }

    /// Raw bit patterns, for exact trajectory comparison.
    pub fn to_bits(&self) -> [u64; 4] {
        self.to_array().map(f64::to_bits)
    }

    fn ensure_finite(&self, names: [&'static str; 4]) -> SimResult<()> {
        for (value, what) in self.to_array().into_iter().zip(names) {
            ensure_finite(value, what)?;
        }
        Ok(())
    }
}

impl Default for PlantState {
    fn default() -> Self {
        Self::zeros()
    }
}

/// Cart travel limits `[y_min, y_max]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackBounds {
    pub min: f64,
    pub max: f64,
}

impl TrackBounds {
    pub fn new(min: Length, max: Length) -> SimResult<Self> {
        let min = ensure_finite(in_m(min), "y1_min")?;
        let max = ensure_finite(in_m(max), "y1_max")?;
        if min >= max {
            return Err(SimError::InvalidArg {
                what: "y1_min must be less than y1_max",
            });
        }
        Ok(Self { min, max })
    }

    /// Closed-interval membership.
    pub fn contains(&self, y: f64) -> bool {
        y >= self.min && y <= self.max
    }

    /// Clamp the cart position into the track and zero its velocity when it
    /// touches an end stop. Returns `true` if the state was clamped.
    pub fn clamp(&self, state: &mut PlantState) -> bool {
        let mut clamped = false;
        if state.x[2] <= self.min {
            state.x[2] = self.min;
            state.x[3] = 0.0;
            clamped = true;
        }
        if state.x[2] >= self.max {
            state.x[2] = self.max;
            state.x[3] = 0.0;
            clamped = true;
        }
        clamped
    }
}

/// Immutable physical and numerical constants of one plant.
#[derive(Clone, Debug, PartialEq)]
pub struct PlantParameters {
    /// Cart mass M (kg)
    pub cart_mass: f64,
    /// Pole mass m (kg)
    pub pole_mass: f64,
    /// Half pole length l (m)
    pub half_length: f64,
    /// Cart resistance coefficient K (N·s/m)
    pub damping: f64,
    /// Gravitational acceleration g (m/s²)
    pub gravity: f64,
    /// RK4 sub-steps per control period (N)
    pub substeps: usize,
    /// Control period T_step (s)
    pub control_period: f64,
    /// Cart travel limits
    pub bounds: TrackBounds,
}

impl PlantParameters {
    /// Create a validated parameter set.
    ///
    /// # Errors
    /// Returns `InvalidArg` for non-positive masses, length or period, negative
    /// damping, or zero sub-steps.
    pub fn new(
        cart_mass: Mass,
        pole_mass: Mass,
        half_length: Length,
        damping: f64,
        substeps: usize,
        control_period: Time,
        bounds: TrackBounds,
    ) -> SimResult<Self> {
        let cart_mass = ensure_positive(in_kg(cart_mass), "M")?;
        let pole_mass = ensure_positive(in_kg(pole_mass), "m")?;
        let half_length = ensure_positive(in_m(half_length), "l")?;
        let damping = ensure_non_negative(damping, "K")?;
        let control_period = ensure_positive(in_s(control_period), "control period")?;
        if substeps == 0 {
            return Err(SimError::InvalidArg {
                what: "N must be at least 1",
            });
        }
        Ok(Self {
            cart_mass,
            pole_mass,
            half_length,
            damping,
            gravity: G_MPS2,
            substeps,
            control_period,
            bounds,
        })
    }

    /// Integration step `T_step / N`.
    pub fn dt(&self) -> f64 {
        self.control_period / self.substeps as f64
    }

    fn inverse_total_mass(&self) -> f64 {
        1.0 / (self.pole_mass + self.cart_mass)
    }
}

/// Discrete mode of the hybrid cart-pole dynamics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DynamicsMode {
    /// Full coupled cart-pole dynamics.
    Normal,
    /// Cart held against an end stop; only the pole swings.
    Saturated,
}

impl DynamicsMode {
    /// Saturated when the force pushes further into an end stop the cart
    /// already touches.
    pub fn select(u: f64, y: f64, bounds: &TrackBounds) -> Self {
        if (u < 0.0 && y <= bounds.min) || (u > 0.0 && y >= bounds.max) {
            DynamicsMode::Saturated
        } else {
            DynamicsMode::Normal
        }
    }

    pub fn derivative(self, params: &PlantParameters, state: &PlantState, u: f64) -> PlantState {
        match self {
            DynamicsMode::Normal => normal_derivative(params, state, u),
            DynamicsMode::Saturated => saturated_derivative(params, state),
        }
    }
}

/// Coupled nonlinear cart-pole derivative.
pub fn normal_derivative(params: &PlantParameters, state: &PlantState, u: f64) -> PlantState {
    let [x1, x2, _, y2] = state.to_array();
    let m = params.pole_mass;
    let l = params.half_length;
    let g = params.gravity;
    let k = params.damping;
    let a = params.inverse_total_mass();

    let sin = x1.sin();
    let cos = x1.cos();

    let x2_dot = (g * sin - l * x1 - a * m * l * x2 * x2 * (2.0 * x1).sin() / 2.0 - a * cos * u)
        / (4.0 / 3.0 * l - a * m * l * cos * cos);
    let y2_dot = a * (u + m * l * sin * x2 * x2 - m * l * cos * x2_dot - k * y2);

    PlantState::new(x2, x2_dot, y2, y2_dot)
}

/// Pole-only derivative with the cart frozen.
pub fn saturated_derivative(params: &PlantParameters, state: &PlantState) -> PlantState {
    let x1 = state.theta();
    let l = params.half_length;
    let x2_dot = (params.gravity * x1.sin() - l * x1) / (4.0 / 3.0 * l);
    PlantState::new(state.theta_dot(), x2_dot, 0.0, 0.0)
}

/// Counters collected over one `advance` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdvanceStats {
    pub substeps: usize,
    pub evaluations: usize,
    pub saturated_evaluations: usize,
    pub clamps: usize,
}

/// Cart-pole dynamics with the control force held constant.
pub struct CartPoleDynamics<'a> {
    params: &'a PlantParameters,
    u: f64,
    stats: AdvanceStats,
}

impl<'a> CartPoleDynamics<'a> {
    pub fn new(params: &'a PlantParameters, u: f64) -> Self {
        Self {
            params,
            u,
            stats: AdvanceStats::default(),
        }
    }

    pub fn stats(&self) -> AdvanceStats {
        self.stats
    }
}

impl TransientModel for CartPoleDynamics<'_> {
    type State = PlantState;

    fn rhs(&mut self, _t: f64, x: &PlantState) -> SimResult<PlantState> {
        let mode = DynamicsMode::select(self.u, x.y(), &self.params.bounds);
        self.stats.evaluations += 1;
        if mode == DynamicsMode::Saturated {
            self.stats.saturated_evaluations += 1;
        }
        let xdot = mode.derivative(self.params, x, self.u);
        xdot.ensure_finite(DERIVATIVE_NAMES)?;
        Ok(xdot)
    }

    fn add(&self, a: &PlantState, b: &PlantState) -> PlantState {
        PlantState { x: a.x + b.x }
    }

    fn scale(&self, a: &PlantState, scale: f64) -> PlantState {
        PlantState { x: a.x * scale }
    }
}

/// Plant run status.
#[derive(Clone, Debug, PartialEq)]
pub enum PlantStatus {
    Running,
    /// A numerical fault stopped integration; the state is held.
    Frozen { reason: String },
}

/// Cart-pole plant: owns its state and advances it one control period at a time.
#[derive(Debug)]
pub struct CartPolePlant {
    params: PlantParameters,
    state: PlantState,
    status: PlantStatus,
    elapsed_s: f64,
    last_stats: AdvanceStats,
    pending_fault: Option<SimError>,
}

impl CartPolePlant {
    /// Create a plant at the given initial state.
    ///
    /// # Errors
    /// Returns error if the initial state is non-finite or the cart starts
    /// outside the track.
    pub fn new(params: PlantParameters, initial: PlantState) -> SimResult<Self> {
        initial.ensure_finite(STATE_NAMES)?;
        if !params.bounds.contains(initial.y()) {
            return Err(SimError::InvalidArg {
                what: "y1_init must lie within the track bounds",
            });
        }
        Ok(Self {
            params,
            state: initial,
            status: PlantStatus::Running,
            elapsed_s: 0.0,
            last_stats: AdvanceStats::default(),
            pending_fault: None,
        })
    }

    pub fn params(&self) -> &PlantParameters {
        &self.params
    }

    pub fn current_state(&self) -> PlantState {
        self.state
    }

    pub fn status(&self) -> &PlantStatus {
        &self.status
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self.status, PlantStatus::Frozen { .. })
    }

    /// Simulated time integrated so far (s).
    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_s
    }

    pub fn last_stats(&self) -> AdvanceStats {
        self.last_stats
    }

    /// Take the fault that froze the plant, if it has not been taken yet.
    pub fn take_fault(&mut self) -> Option<SimError> {
        self.pending_fault.take()
    }

    /// Advance one control period under force `u`.
    ///
    /// `None` means no control input has been delivered yet; the state is left
    /// untouched. A frozen plant also ignores the call.
    pub fn advance(&mut self, u: Option<f64>) -> PlantState {
        let Some(u) = u else {
            return self.state;
        };
        if self.is_frozen() {
            return self.state;
        }

        let mut dynamics = CartPoleDynamics::new(&self.params, u);
        let result = integrate_period(&mut dynamics, &mut self.state, &mut self.elapsed_s);
        self.last_stats = dynamics.stats();

        tracing::trace!(
            u,
            evaluations = self.last_stats.evaluations,
            saturated = self.last_stats.saturated_evaluations,
            clamps = self.last_stats.clamps,
            "plant advanced"
        );

        if let Err(err) = result {
            self.freeze(err);
        }
        self.state
    }

    fn freeze(&mut self, err: SimError) {
        tracing::error!(
            elapsed_s = self.elapsed_s,
            error = %err,
            "plant frozen after numerical fault"
        );
        self.status = PlantStatus::Frozen {
            reason: err.to_string(),
        };
        self.pending_fault = Some(err);
    }
}

/// Run `N` RK4 sub-steps, clamping after each one. On error the state keeps
/// the last finite sub-step result.
fn integrate_period(
    dynamics: &mut CartPoleDynamics<'_>,
    state: &mut PlantState,
    elapsed_s: &mut f64,
) -> SimResult<()> {
    let params = dynamics.params;
    let dt = params.dt();
    for _ in 0..params.substeps {
        let next = RK4.step(dynamics, *elapsed_s, state, dt)?;
        next.ensure_finite(STATE_NAMES)?;
        *state = next;
        if params.bounds.clamp(state) {
            dynamics.stats.clamps += 1;
        }
        dynamics.stats.substeps += 1;
        *elapsed_s += dt;
    }
    Ok(())
}
