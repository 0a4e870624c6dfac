//! # roost-cli
//!
//! Command-line interface for the Roost routine runner.
//!
//! ## Commands
//!
//! - `roost run <name>` — Run a routine through the harness
//! - `roost list` — List registered routines
//! - `roost info <name>` — Show a routine's session strategy
//! - `roost config` — Show the resolved configuration
//! - `roost version` — Show version info

pub mod commands;

pub use commands::Cli;
