//! # roost-routines
//!
//! The routines that ship with Roost. Each one is a small, self-contained
//! unit of behavior: build a prompt, optionally restrict capabilities,
//! handle the result. Session strategy varies per routine — `handoff`
//! forks from the human session, `daily_summary` is stateless, `journal`
//! keeps a rolling thread of its own.
//!
//! Registration is an explicit startup step, never an import side effect.

pub mod daily_summary;
pub mod handoff;
pub mod journal;

use std::sync::Arc;

use tracing::info;

use roost_core::Result;
use roost_runtime::RoutineRegistry;
use roost_store::SessionStore;

pub use daily_summary::DailySummaryRoutine;
pub use handoff::HandoffRoutine;
pub use journal::JournalRoutine;

/// Register every built-in routine. Called once during process
/// initialization; a duplicate name here is a startup bug and fails the
/// process loudly.
pub fn register_builtins(
    registry: &mut RoutineRegistry,
    store: &Arc<dyn SessionStore>,
) -> Result<()> {
    registry.register(Arc::new(HandoffRoutine::new(Arc::clone(store))))?;
    registry.register(Arc::new(DailySummaryRoutine::new(Arc::clone(store))))?;
    registry.register(Arc::new(JournalRoutine::new(Arc::clone(store))))?;
    info!(count = registry.len(), "registered built-in routines");
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_ctx(name: &str, is_new_session: bool) -> roost_core::InvocationContext {
    use chrono::TimeZone;

    roost_core::InvocationContext {
        routine_name: name.to_string(),
        run_id: uuid::Uuid::new_v4(),
        label: roost_core::InvocationContext::label_for(name),
        now: chrono_tz::America::Los_Angeles
            .with_ymd_and_hms(2025, 6, 1, 21, 45, 0)
            .unwrap(),
        resume: None,
        commit_key: None,
        is_new_session,
    }
}
