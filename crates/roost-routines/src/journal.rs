//! Rolling journal thread — a self-managed session that accumulates
//! entries across runs until a week of silence lets it lapse.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use roost_core::{InvocationContext, Routine, RoutineDefinition};
use roost_store::SessionStore;

const NOTE_KEY: &str = "note:journal";
const NOTE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const SESSION_KEY: &str = "routine:journal.thread";
const SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

pub struct JournalRoutine {
    def: RoutineDefinition,
    store: Arc<dyn SessionStore>,
}

impl JournalRoutine {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            def: RoutineDefinition::new("journal.thread").with_session(SESSION_KEY, SESSION_TTL),
            store,
        }
    }
}

#[async_trait]
impl Routine for JournalRoutine {
    fn definition(&self) -> &RoutineDefinition {
        &self.def
    }

    fn allowed_capabilities(&self) -> Vec<String> {
        vec!["Read".into()]
    }

    async fn build_prompt(&self, ctx: &InvocationContext) -> anyhow::Result<String> {
        let time = ctx.now.format("%-I:%M %p");
        let date = ctx.now.format("%A, %B %-d");

        let opening = if ctx.is_new_session {
            "This is a fresh journal thread; open it however feels right."
        } else {
            "This is the same journal thread as before; pick up where it left off."
        };

        Ok(format!(
            "<routine name=\"journal.thread\">\n\
             This prompt comes from the journal routine, not a person. \
             It's {time} on {date}. {opening}\n\n\
             Add one entry: a few sentences on where things stand and \
             anything worth remembering later.\n\
             </routine>"
        ))
    }

    async fn handle_output(&self, output: &str, _ctx: &InvocationContext) -> anyhow::Result<()> {
        let entry = output.trim();
        self.store.set(NOTE_KEY, entry, NOTE_TTL).await?;
        info!(chars = entry.len(), key = NOTE_KEY, "stored journal entry");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_ctx;
    use roost_store::MemorySessionStore;

    #[test]
    fn test_definition_self_manages_its_session() {
        let store = Arc::new(MemorySessionStore::new()) as Arc<dyn SessionStore>;
        let routine = JournalRoutine::new(store);
        let def = routine.definition();
        assert_eq!(def.session_key.as_deref(), Some(SESSION_KEY));
        assert!(!def.fork_session);
        assert_eq!(def.session_ttl, SESSION_TTL);
    }

    #[tokio::test]
    async fn test_prompt_acknowledges_thread_state() {
        let store = Arc::new(MemorySessionStore::new()) as Arc<dyn SessionStore>;
        let routine = JournalRoutine::new(store);

        let fresh = routine
            .build_prompt(&test_ctx("journal.thread", true))
            .await
            .unwrap();
        assert!(fresh.contains("fresh journal thread"));

        let resumed = routine
            .build_prompt(&test_ctx("journal.thread", false))
            .await
            .unwrap();
        assert!(resumed.contains("same journal thread"));
    }

    #[tokio::test]
    async fn test_output_stored_trimmed() {
        let store = Arc::new(MemorySessionStore::new());
        let routine = JournalRoutine::new(Arc::clone(&store) as Arc<dyn SessionStore>);
        routine
            .handle_output("\nentry body\n\n", &test_ctx("journal.thread", false))
            .await
            .unwrap();
        assert_eq!(
            store.get(NOTE_KEY).await.unwrap().as_deref(),
            Some("entry body")
        );
    }
}
