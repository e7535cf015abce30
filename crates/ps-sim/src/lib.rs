//! Continuous-time plant simulation for polesim.
//!
//! Provides:
//! - `TransientModel` trait for pluggable dynamic systems
//! - Fixed-step RK4 and forward Euler integrators
//! - Cart-pole (inverted pendulum) plant with saturation mode switching
//! - Open-loop runner with trajectory recording

pub mod error;
pub mod integrator;
pub mod model;
pub mod plant;
pub mod sim;

pub use error::{SimError, SimResult};
pub use integrator::{ForwardEuler, Integrator, RK4};
pub use model::TransientModel;
pub use plant::{
    AdvanceStats, CartPoleDynamics, CartPolePlant, DynamicsMode, PlantParameters, PlantState,
    PlantStatus, TrackBounds,
};
pub use sim::{OpenLoopOptions, SimRecord, run_open_loop};
