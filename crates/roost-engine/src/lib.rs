//! # roost-engine
//!
//! The agent-execution engine seam. The harness hands an engine a prompt,
//! a capability allow-list, resume/fork hints, and an invocation label; it
//! gets back a single terminal text result and, when the engine produced
//! one, a resumable session token. Everything behind that contract — wire
//! protocol, streaming, process model — is the engine's own business.

pub mod engine;
pub mod mock;
pub mod subprocess;

pub use engine::{AgentEngine, EngineOutcome, EngineRequest};
pub use mock::{MockEngine, MockOutcome};
pub use subprocess::{SubprocessEngine, SubprocessEngineConfig};
