//! Control-side primitives for polesim.
//!
//! The plant and its collaborators exchange data as batches of named,
//! timestamped scalar samples. This crate provides:
//! - [`NamedSample`] and batch lookup helpers
//! - A PID controller with anti-windup and derivative filtering
//! - Command (setpoint) profiles
//!
//! # Architecture
//!
//! Controllers and command sources are pure: configuration structs hold
//! parameters, separate state structs hold what evolves, and every update
//! returns the new state together with its output.

pub mod command;
pub mod controller;
pub mod error;
pub mod signal;

pub use command::CommandProfile;
pub use controller::{PIDController, PIDControllerState};
pub use error::{ControlError, ControlResult};
pub use signal::{NamedSample, SampleBatch, find_sample, first_duplicate_key};
