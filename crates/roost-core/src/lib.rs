//! # roost-core
//!
//! Core types, traits, and primitives for the Roost routine runner.
//! This crate defines the shared vocabulary used by every other crate in
//! the workspace: the routine contract, the per-invocation context, the
//! error taxonomy, and the injectable clock.

pub mod clock;
pub mod error;
pub mod routine;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Result, RoostError};
pub use routine::{InvocationContext, Routine, RoutineDefinition, SessionRecord};
