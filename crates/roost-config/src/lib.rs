//! # roost-config
//!
//! Configuration for the Roost runner — `roost.toml` schema, path
//! resolution, env-var overrides, and validation.

pub mod loader;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{EngineConfig, HarnessConfig, LoggingConfig, RoostConfig, StoreConfig};
