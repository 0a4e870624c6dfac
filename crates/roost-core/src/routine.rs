use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque resumable-conversation token. The engine owns the format; Roost
/// only stores it, replays it, and never looks inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionRecord(String);

impl SessionRecord {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// First eight characters, for log lines.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map_or(self.0.len(), |(i, _)| i);
        &self.0[..end]
    }
}

/// Static description of a routine: its name and session strategy.
///
/// Three strategies fall out of the fields:
/// - `session_key = None` — stateless, the store is never touched
/// - `session_key = Some(_)`, `fork_session = false` — self-managed session
/// - `fork_session = true` — start from a copy of `fork_from_key`, commit
///   to the routine's own `session_key`, never back to the source
#[derive(Debug, Clone)]
pub struct RoutineDefinition {
    /// Unique registry key, e.g. "notes.handoff".
    pub name: String,
    /// Store key for session persistence. `None` = stateless.
    pub session_key: Option<String>,
    /// TTL applied whenever this routine's session is written or refreshed.
    pub session_ttl: Duration,
    /// If true, this invocation starts from a copy of another session.
    pub fork_session: bool,
    /// Store key to fork from. Required when `fork_session` is true.
    pub fork_from_key: Option<String>,
}

impl RoutineDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            session_key: None,
            session_ttl: Duration::from_secs(24 * 60 * 60),
            fork_session: false,
            fork_from_key: None,
        }
    }

    /// Give the routine its own session slot with the given TTL.
    pub fn with_session(mut self, key: impl Into<String>, ttl: Duration) -> Self {
        self.session_key = Some(key.into());
        self.session_ttl = ttl;
        self
    }

    /// Fork from another session instead of resuming the routine's own.
    /// The source is only ever read; commits go to `session_key`.
    pub fn with_fork_from(mut self, key: impl Into<String>) -> Self {
        self.fork_session = true;
        self.fork_from_key = Some(key.into());
        self
    }

    pub fn is_stateless(&self) -> bool {
        self.session_key.is_none()
    }
}

/// Per-run context handed to the routine's prompt builder and output
/// handler. Created fresh for every invocation and consumed once.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub routine_name: String,
    /// Correlation id for logs. Not a correctness input.
    pub run_id: Uuid,
    /// Downstream routing label, `routine:{name}`. Distinguishes automated
    /// from human-originated activity; never a security boundary.
    pub label: String,
    /// Current time in the configured reference timezone.
    pub now: DateTime<Tz>,
    /// Record the engine resumes from, if any.
    pub resume: Option<SessionRecord>,
    /// Where resulting state is committed, if anywhere.
    pub commit_key: Option<String>,
    /// True when no prior record was found (first run, or TTL expiry).
    pub is_new_session: bool,
}

impl InvocationContext {
    pub fn label_for(name: &str) -> String {
        format!("routine:{name}")
    }
}

/// The contract every routine implements. The harness depends only on this
/// trait, never on concrete routine types.
#[async_trait]
pub trait Routine: Send + Sync {
    /// Static definition: name, session strategy, TTL.
    fn definition(&self) -> &RoutineDefinition;

    /// Capability allow-list passed to the engine. Pure; evaluated once
    /// per run, before the engine is invoked.
    fn allowed_capabilities(&self) -> Vec<String>;

    /// Build the prompt for this invocation.
    async fn build_prompt(&self, ctx: &InvocationContext) -> anyhow::Result<String>;

    /// Receive the engine's terminal text output. Runs after the session
    /// commit, so persisted state is independent of what happens here.
    async fn handle_output(&self, output: &str, ctx: &InvocationContext) -> anyhow::Result<()>;

    fn name(&self) -> &str {
        &self.definition().name
    }
}
