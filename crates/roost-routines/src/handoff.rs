//! Nightly handoff note — forks from the day's human session.
//!
//! Forward-looking, not a chronicle: what is being carried into tomorrow.
//! Forking keeps the human session uncontaminated; the routine's own slot
//! holds the fork's state.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use roost_core::{InvocationContext, Routine, RoutineDefinition};
use roost_store::{HUMAN_SESSION_KEY, SessionStore};

/// Where the note lands for tomorrow's briefing.
const NOTE_KEY: &str = "note:handoff";
/// Survives until well into the next afternoon.
const NOTE_TTL: Duration = Duration::from_secs(18 * 60 * 60);

const SESSION_KEY: &str = "routine:notes.handoff";
const SESSION_TTL: Duration = Duration::from_secs(18 * 60 * 60);

pub struct HandoffRoutine {
    def: RoutineDefinition,
    store: Arc<dyn SessionStore>,
}

impl HandoffRoutine {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            def: RoutineDefinition::new("notes.handoff")
                .with_session(SESSION_KEY, SESSION_TTL)
                .with_fork_from(HUMAN_SESSION_KEY),
            store,
        }
    }
}

#[async_trait]
impl Routine for HandoffRoutine {
    fn definition(&self) -> &RoutineDefinition {
        &self.def
    }

    fn allowed_capabilities(&self) -> Vec<String> {
        vec!["Read".into(), "Bash".into()]
    }

    async fn build_prompt(&self, ctx: &InvocationContext) -> anyhow::Result<String> {
        let time = ctx.now.format("%-I:%M %p");
        let date = ctx.now.format("%A, %B %-d");

        if ctx.is_new_session {
            // Nothing captured today; write a shorter bridge note anyway.
            Ok(format!(
                "<routine name=\"notes.handoff\">\n\
                 This prompt comes from the handoff routine, not a person. \
                 It's {time} on {date}. No session from today was captured.\n\n\
                 Write a brief note to tomorrow anyway, drawing on whatever \
                 general state you have. A paragraph is enough.\n\n\
                 The harness stores the note for tomorrow's briefing.\n\
                 </routine>"
            ))
        } else {
            Ok(format!(
                "<routine name=\"notes.handoff\">\n\
                 This prompt comes from the handoff routine, not a person. \
                 It's {time} on {date}, and you are a fork of today's \
                 session.\n\n\
                 Write a short note (1-3 paragraphs) for tomorrow: which \
                 threads are unfinished, what matters right now that might \
                 fade by morning, what the shape of today was.\n\n\
                 The harness stores the note for tomorrow's briefing, then \
                 this fork is set aside.\n\
                 </routine>"
            ))
        }
    }

    async fn handle_output(&self, output: &str, ctx: &InvocationContext) -> anyhow::Result<()> {
        let header = format!("**Handoff note** ({}):\n\n", ctx.now.format("%-I:%M %p"));
        let note = format!("{header}{}", output.trim());

        self.store.set(NOTE_KEY, &note, NOTE_TTL).await?;
        info!(chars = note.len(), key = NOTE_KEY, "stored handoff note");
        Ok(())
    }
}
