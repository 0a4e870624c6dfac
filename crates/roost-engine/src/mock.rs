//! Mock engine for deterministic testing.
//!
//! Returns pre-configured outcomes without spawning anything.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use roost_core::{Result, RoostError, SessionRecord};

use crate::engine::{AgentEngine, EngineOutcome, EngineRequest};

/// A pre-configured outcome from the mock engine.
#[derive(Debug, Clone, Default)]
pub struct MockOutcome {
    pub result_text: String,
    pub session: Option<SessionRecord>,
    /// If set, the engine returns this error instead.
    pub error: Option<String>,
    /// Simulated execution time, for timeout tests.
    pub delay: Option<Duration>,
}

impl MockOutcome {
    /// A text outcome with a resulting session token.
    pub fn with_session(text: &str, session: &str) -> Self {
        Self {
            result_text: text.to_string(),
            session: Some(SessionRecord::new(session)),
            ..Default::default()
        }
    }

    /// A text outcome with no resulting session.
    pub fn text(text: &str) -> Self {
        Self {
            result_text: text.to_string(),
            ..Default::default()
        }
    }

    /// An error outcome.
    pub fn error(msg: &str) -> Self {
        Self {
            error: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

/// A mock engine that replays queued outcomes in order.
///
/// # Example
/// ```
/// use roost_engine::{MockEngine, MockOutcome};
/// let engine = MockEngine::new().with_outcome(MockOutcome::text("hello"));
/// ```
#[derive(Default)]
pub struct MockEngine {
    outcomes: Arc<Mutex<Vec<MockOutcome>>>,
    /// Every request received, for assertions in tests.
    pub requests: Arc<Mutex<Vec<EngineRequest>>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an outcome.
    pub fn with_outcome(self, outcome: MockOutcome) -> Self {
        self.outcomes.lock().unwrap().push(outcome);
        self
    }

    /// Queue an error.
    pub fn with_error(self, msg: &str) -> Self {
        self.outcomes.lock().unwrap().push(MockOutcome::error(msg));
        self
    }

    /// All requests made so far.
    pub fn recorded_requests(&self) -> Arc<Mutex<Vec<EngineRequest>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl AgentEngine for MockEngine {
    async fn execute(&self, request: EngineRequest) -> Result<EngineOutcome> {
        self.requests.lock().unwrap().push(request);

        let outcome = {
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.is_empty() {
                MockOutcome::text("mock output")
            } else {
                outcomes.remove(0)
            }
        };

        if let Some(delay) = outcome.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = outcome.error {
            return Err(RoostError::EngineExecution(error));
        }

        Ok(EngineOutcome {
            result_text: outcome.result_text,
            session: outcome.session,
        })
    }
}
