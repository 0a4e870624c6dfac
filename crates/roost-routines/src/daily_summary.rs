//! Rolling "today so far" summary. Stateless: each run stands alone.
//!
//! Bridges the gap between a live conversation and yesterday's archive —
//! re-run through the day, the stored note keeps a continuous sense of
//! "today" available for briefing assembly.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use roost_core::{InvocationContext, Routine, RoutineDefinition};
use roost_store::SessionStore;

const NOTE_KEY: &str = "note:daily";
/// Refreshed hourly; a little slack past the hour.
const NOTE_TTL: Duration = Duration::from_secs(65 * 60);

pub struct DailySummaryRoutine {
    def: RoutineDefinition,
    store: Arc<dyn SessionStore>,
}

impl DailySummaryRoutine {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            def: RoutineDefinition::new("notes.daily_summary"),
            store,
        }
    }
}

#[async_trait]
impl Routine for DailySummaryRoutine {
    fn definition(&self) -> &RoutineDefinition {
        &self.def
    }

    fn allowed_capabilities(&self) -> Vec<String> {
        // Pure summarization.
        vec![]
    }

    async fn build_prompt(&self, ctx: &InvocationContext) -> anyhow::Result<String> {
        let time = ctx.now.format("%-I:%M %p");
        let date = ctx.now.format("%A, %B %-d");

        Ok(format!(
            "<routine name=\"notes.daily_summary\">\n\
             This prompt comes from the daily-summary routine, not a \
             person. It's {time} on {date}.\n\n\
             Write a brief summary of today so far: what has happened, \
             what matters, what the day feels like it is about. A reader \
             with no memory of the day should come away oriented.\n\n\
             A paragraph or two. No headers, no bullet points.\n\
             </routine>"
        ))
    }

    async fn handle_output(&self, output: &str, ctx: &InvocationContext) -> anyhow::Result<()> {
        let summary = output.trim();
        self.store.set(NOTE_KEY, summary, NOTE_TTL).await?;
        self.store
            .set(
                &format!("{NOTE_KEY}:time"),
                &ctx.now.format("%-I:%M %p").to_string(),
                NOTE_TTL,
            )
            .await?;
        info!(chars = summary.len(), key = NOTE_KEY, "stored daily summary");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_ctx;
    use roost_store::MemorySessionStore;

    #[test]
    fn test_definition_is_stateless() {
        let store = Arc::new(MemorySessionStore::new()) as Arc<dyn SessionStore>;
        let routine = DailySummaryRoutine::new(store);
        assert!(routine.definition().is_stateless());
        assert!(routine.allowed_capabilities().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_carries_reference_time() {
        let store = Arc::new(MemorySessionStore::new()) as Arc<dyn SessionStore>;
        let routine = DailySummaryRoutine::new(store);
        let prompt = routine
            .build_prompt(&test_ctx("notes.daily_summary", true))
            .await
            .unwrap();
        assert!(prompt.contains("9:45 PM"));
        assert!(prompt.contains("Sunday, June 1"));
    }

    #[tokio::test]
    async fn test_output_stored_with_timestamp_sidecar() {
        let store = Arc::new(MemorySessionStore::new());
        let routine = DailySummaryRoutine::new(Arc::clone(&store) as Arc<dyn SessionStore>);
        routine
            .handle_output("quiet day, mostly plumbing\n", &test_ctx("notes.daily_summary", true))
            .await
            .unwrap();

        assert_eq!(
            store.get("note:daily").await.unwrap().as_deref(),
            Some("quiet day, mostly plumbing")
        );
        assert_eq!(
            store.get("note:daily:time").await.unwrap().as_deref(),
            Some("9:45 PM")
        );
    }
}
