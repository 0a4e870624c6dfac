use async_trait::async_trait;
use roost_core::{Result, SessionRecord};

/// One engine invocation, fully described.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    pub prompt: String,
    /// Capability names the engine may use. Empty = none.
    pub allowed_capabilities: Vec<String>,
    /// Prior state to resume from, if any.
    pub resume: Option<SessionRecord>,
    /// Start from a copy of `resume` instead of appending to it.
    pub fork: bool,
    /// `routine:{name}` — invocation metadata consumed by downstream
    /// routing and observability, never a security boundary.
    pub label: String,
}

/// What came back from a completed engine invocation.
#[derive(Debug, Clone)]
pub struct EngineOutcome {
    /// The terminal text result.
    pub result_text: String,
    /// Resumable state after this run, when the engine produced one.
    pub session: Option<SessionRecord>,
}

/// Trait implemented by each engine integration (subprocess, mock, ...).
#[async_trait]
pub trait AgentEngine: Send + Sync {
    /// Run one prompt to completion. Blocking from the caller's point of
    /// view: the engine may stream internally, but a single terminal
    /// result or failure comes back.
    async fn execute(&self, request: EngineRequest) -> Result<EngineOutcome>;
}
