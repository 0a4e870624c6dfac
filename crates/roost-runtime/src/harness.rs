use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use chrono_tz::Tz;
use tracing::{debug, info, warn};
use uuid::Uuid;

use roost_core::{Clock, InvocationContext, Result, RoostError, SessionRecord};
use roost_engine::{AgentEngine, EngineRequest};
use roost_store::SessionStore;

use crate::registry::RoutineRegistry;
use crate::resolver::{SessionPlan, SessionResolver};

/// What a completed run looked like. `commit_error` is set when the run
/// produced output but session continuity was lost — degraded, not fatal.
#[derive(Debug)]
pub struct RunReport {
    pub routine: String,
    pub run_id: Uuid,
    pub label: String,
    pub started_at: DateTime<Tz>,
    pub output: String,
    /// Key the session was committed to, when a commit happened.
    pub committed: Option<String>,
    /// Commit failure message, when the commit failed.
    pub commit_error: Option<String>,
    pub duration: Duration,
}

/// The single orchestration point: lookup → resolve → build → invoke →
/// commit → handle. Owns each invocation's outcome and contains failures
/// so one bad run never takes the process down or bleeds into concurrent
/// runs.
pub struct Harness {
    registry: Arc<RoutineRegistry>,
    resolver: SessionResolver,
    store: Arc<dyn SessionStore>,
    engine: Arc<dyn AgentEngine>,
    clock: Arc<dyn Clock>,
    engine_timeout: Duration,
}

impl Harness {
    pub fn new(
        registry: Arc<RoutineRegistry>,
        store: Arc<dyn SessionStore>,
        engine: Arc<dyn AgentEngine>,
        clock: Arc<dyn Clock>,
        engine_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            resolver: SessionResolver::new(Arc::clone(&store)),
            store,
            engine,
            clock,
            engine_timeout,
        }
    }

    /// Run one routine to completion. At most one engine invocation per
    /// call — retries, if wanted, belong to whatever triggered the run.
    pub async fn run(&self, name: &str) -> Result<RunReport> {
        let started = std::time::Instant::now();

        let routine = self.registry.get(name)?;
        let def = routine.definition();

        let plan = self.resolver.resolve(def).await?;

        let run_id = Uuid::new_v4();
        let label = InvocationContext::label_for(name);
        let ctx = InvocationContext {
            routine_name: name.to_string(),
            run_id,
            label: label.clone(),
            now: self.clock.now(),
            resume: plan.resume.clone(),
            commit_key: plan.commit_key.clone(),
            is_new_session: plan.is_new_session,
        };

        info!(
            routine = name,
            %run_id,
            resume = ctx.resume.as_ref().map(|r| r.short()),
            fork = plan.fork,
            "starting run"
        );

        let prompt = routine
            .build_prompt(&ctx)
            .await
            .map_err(|e| RoostError::RoutineBuild {
                routine: name.to_string(),
                reason: format!("{e:#}"),
            })?;
        debug!(routine = name, chars = prompt.len(), "built prompt");

        let request = EngineRequest {
            prompt,
            allowed_capabilities: routine.allowed_capabilities(),
            resume: plan.resume.clone(),
            fork: plan.fork,
            label: label.clone(),
        };

        let outcome =
            match tokio::time::timeout(self.engine_timeout, self.engine.execute(request)).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(RoostError::EngineExecution(reason))) => {
                    return Err(RoostError::EngineExecution(reason));
                }
                Ok(Err(other)) => return Err(RoostError::EngineExecution(other.to_string())),
                Err(_) => {
                    return Err(RoostError::EngineExecution(format!(
                        "timed out after {}s",
                        self.engine_timeout.as_secs()
                    )));
                }
            };

        let (committed, commit_error) = self
            .commit(&plan, def.session_ttl, outcome.session.as_ref())
            .await;

        // Commit-before-handle: persisted state reflects what the engine
        // produced regardless of what the handler does with it.
        routine
            .handle_output(&outcome.result_text, &ctx)
            .await
            .map_err(|e| RoostError::RoutineOutput {
                routine: name.to_string(),
                reason: format!("{e:#}"),
            })?;

        info!(
            routine = name,
            %run_id,
            chars = outcome.result_text.len(),
            committed = committed.as_deref(),
            "run complete"
        );

        Ok(RunReport {
            routine: name.to_string(),
            run_id,
            label,
            started_at: ctx.now,
            output: outcome.result_text,
            committed,
            commit_error,
            duration: started.elapsed(),
        })
    }

    /// Commit resulting state per the plan. Runs on its own task so a
    /// caller dropping the run future mid-commit cannot leave a
    /// half-written record. Never fails the run: output was already
    /// produced, and losing continuity is degraded rather than total.
    async fn commit(
        &self,
        plan: &SessionPlan,
        ttl: Duration,
        new_session: Option<&SessionRecord>,
    ) -> (Option<String>, Option<String>) {
        let Some(key) = plan.commit_key.clone() else {
            return (None, None);
        };

        let resumed_in_place = !plan.is_new_session && !plan.fork;
        let record = match new_session {
            Some(record) => Some(record.clone()),
            // Some engines report no terminal state for a resumed run;
            // the record we resumed from is still the one to keep alive.
            None if resumed_in_place => plan.resume.clone(),
            None => None,
        };
        let Some(record) = record else {
            debug!(%key, "engine produced no session state, nothing to commit");
            return (None, None);
        };

        let unchanged = resumed_in_place && plan.resume.as_ref() == Some(&record);
        let store = Arc::clone(&self.store);
        let task_key = key.clone();
        let result = tokio::spawn(async move {
            if unchanged {
                // Refresh the TTL rather than rewriting an identical blob.
                // If the record expired mid-run, fall through to a write.
                if store.expire(&task_key, ttl).await? {
                    return Ok(());
                }
            }
            store.set(&task_key, record.as_str(), ttl).await
        })
        .await;

        match result {
            Ok(Ok(())) => {
                info!(%key, refreshed = unchanged, "session committed");
                (Some(key), None)
            }
            Ok(Err(e)) => {
                let commit_err = RoostError::SessionCommit {
                    key: key.clone(),
                    reason: e.to_string(),
                };
                warn!(%key, error = %commit_err, "session commit failed, continuing");
                (None, Some(commit_err.to_string()))
            }
            Err(join_err) => {
                let commit_err = RoostError::SessionCommit {
                    key: key.clone(),
                    reason: format!("commit task failed: {join_err}"),
                };
                warn!(%key, error = %commit_err, "session commit failed, continuing");
                (None, Some(commit_err.to_string()))
            }
        }
    }
}
