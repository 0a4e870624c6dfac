use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use roost_core::{Result, RoostError, RoutineDefinition, SessionRecord};
use roost_store::SessionStore;

/// Retries beyond the first attempt for a session-store read.
const MAX_STORE_RETRIES: u32 = 2;
/// Base delay for exponential backoff between store read attempts.
const BASE_DELAY_MS: u64 = 100;

/// The session half of an invocation: what the engine resumes from, and
/// where resulting state is committed afterward.
#[derive(Debug, Clone)]
pub struct SessionPlan {
    pub resume: Option<SessionRecord>,
    pub commit_key: Option<String>,
    /// True when no prior record was found (first run, or TTL expiry).
    pub is_new_session: bool,
    /// True when `resume` came from another session's slot.
    pub fork: bool,
}

impl SessionPlan {
    fn stateless() -> Self {
        Self {
            resume: None,
            commit_key: None,
            is_new_session: true,
            fork: false,
        }
    }
}

/// Translates a routine definition plus current store state into a
/// [`SessionPlan`]. Three strategies fall out: stateless,
/// fork-from-source, self-managed.
pub struct SessionResolver {
    store: Arc<dyn SessionStore>,
}

impl SessionResolver {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, def: &RoutineDefinition) -> Result<SessionPlan> {
        // Fork without a source is a definition bug, not a runtime fork
        // failure. Catch it before any store access.
        let fork_source = if def.fork_session {
            match &def.fork_from_key {
                Some(key) => Some(key.as_str()),
                None => {
                    return Err(RoostError::InvalidRoutineConfig {
                        routine: def.name.clone(),
                        reason: "fork_session is set but fork_from_key is not".into(),
                    });
                }
            }
        } else {
            None
        };

        // Stateless: no resume, no commit, and the store is never touched.
        let Some(session_key) = &def.session_key else {
            return Ok(SessionPlan::stateless());
        };

        // Forking reads the source slot; self-managed reads its own. A
        // miss is a fresh start, never an error.
        let read_key = fork_source.unwrap_or(session_key);
        let resume = self.read_with_retry(read_key).await?.map(SessionRecord::new);

        match &resume {
            Some(record) => {
                info!(routine = %def.name, key = read_key, session = record.short(), "found session")
            }
            None => info!(routine = %def.name, key = read_key, "no session found, starting fresh"),
        }

        Ok(SessionPlan {
            is_new_session: resume.is_none(),
            resume,
            // Commits always land in the routine's own slot. Forking is
            // copy-semantics: the source is read, never written.
            commit_key: Some(session_key.clone()),
            fork: fork_source.is_some(),
        })
    }

    /// Bounded-backoff read. Transient store failures get a few retries;
    /// exhaustion aborts the run before the engine is ever invoked.
    async fn read_with_retry(&self, key: &str) -> Result<Option<String>> {
        let mut last_err = None;

        for attempt in 0..=MAX_STORE_RETRIES {
            match self.store.get(key).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < MAX_STORE_RETRIES => {
                    let delay = BASE_DELAY_MS * 2u64.pow(attempt);
                    warn!(
                        key,
                        attempt = attempt + 1,
                        max = MAX_STORE_RETRIES + 1,
                        delay_ms = delay,
                        error = %e,
                        "retrying session read after store error"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    last_err = Some(e);
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(RoostError::StoreUnavailable(
            last_err.map_or_else(|| "unknown store error".into(), |e| e.to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use roost_store::MemorySessionStore;

    const TTL: Duration = Duration::from_secs(3600);

    /// Counts every store call so tests can assert "never touched".
    struct CountingStore {
        inner: MemorySessionStore,
        gets: AtomicUsize,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: MemorySessionStore::new(),
                gets: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SessionStore for CountingStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
            self.inner.set(key, value, ttl).await
        }

        async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
            self.inner.expire(key, ttl).await
        }
    }

    /// Fails every `get` with a transient store error.
    struct DownStore;

    #[async_trait]
    impl SessionStore for DownStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(RoostError::Store("connection refused".into()))
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
            Err(RoostError::Store("connection refused".into()))
        }

        async fn expire(&self, _key: &str, _ttl: Duration) -> Result<bool> {
            Err(RoostError::Store("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_stateless_never_touches_store() {
        let store = Arc::new(CountingStore::new());
        let resolver = SessionResolver::new(Arc::clone(&store) as Arc<dyn SessionStore>);
        let def = RoutineDefinition::new("r1");

        let plan = resolver.resolve(&def).await.unwrap();
        assert!(plan.resume.is_none());
        assert!(plan.commit_key.is_none());
        assert!(plan.is_new_session);
        assert_eq!(store.gets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_self_managed_hit() {
        let store = Arc::new(MemorySessionStore::new());
        store.set("routine:r", "sess-1", TTL).await.unwrap();
        let resolver = SessionResolver::new(Arc::clone(&store) as Arc<dyn SessionStore>);
        let def = RoutineDefinition::new("r").with_session("routine:r", TTL);

        let plan = resolver.resolve(&def).await.unwrap();
        assert_eq!(plan.resume, Some(SessionRecord::new("sess-1")));
        assert_eq!(plan.commit_key.as_deref(), Some("routine:r"));
        assert!(!plan.is_new_session);
        assert!(!plan.fork);
    }

    #[tokio::test]
    async fn test_self_managed_miss_is_fresh_start() {
        let store = Arc::new(MemorySessionStore::new());
        let resolver = SessionResolver::new(Arc::clone(&store) as Arc<dyn SessionStore>);
        let def = RoutineDefinition::new("r").with_session("routine:r", TTL);

        let plan = resolver.resolve(&def).await.unwrap();
        assert!(plan.resume.is_none());
        assert!(plan.is_new_session);
        assert_eq!(plan.commit_key.as_deref(), Some("routine:r"));
    }

    #[tokio::test]
    async fn test_fork_reads_source_commits_own_slot() {
        let store = Arc::new(MemorySessionStore::new());
        store
            .set("routine:human_session", "human-sess", TTL)
            .await
            .unwrap();
        let resolver = SessionResolver::new(Arc::clone(&store) as Arc<dyn SessionStore>);
        let def = RoutineDefinition::new("r")
            .with_session("routine:r", TTL)
            .with_fork_from("routine:human_session");

        let plan = resolver.resolve(&def).await.unwrap();
        assert_eq!(plan.resume, Some(SessionRecord::new("human-sess")));
        assert_eq!(plan.commit_key.as_deref(), Some("routine:r"));
        assert!(plan.fork);
    }

    #[tokio::test]
    async fn test_fork_source_miss_is_fresh_start_not_error() {
        let store = Arc::new(MemorySessionStore::new());
        let resolver = SessionResolver::new(store as Arc<dyn SessionStore>);
        let def = RoutineDefinition::new("r")
            .with_session("routine:r", TTL)
            .with_fork_from("routine:human_session");

        let plan = resolver.resolve(&def).await.unwrap();
        assert!(plan.resume.is_none());
        assert!(plan.is_new_session);
        assert!(plan.fork);
    }

    #[tokio::test]
    async fn test_fork_without_source_fails_before_store_access() {
        let store = Arc::new(CountingStore::new());
        let resolver = SessionResolver::new(Arc::clone(&store) as Arc<dyn SessionStore>);
        let mut def = RoutineDefinition::new("r3").with_session("routine:r3", TTL);
        def.fork_session = true;

        let err = resolver.resolve(&def).await.unwrap_err();
        assert!(matches!(err, RoostError::InvalidRoutineConfig { .. }));
        assert_eq!(store.gets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_outage_surfaces_as_unavailable_after_retries() {
        let resolver = SessionResolver::new(Arc::new(DownStore) as Arc<dyn SessionStore>);
        let def = RoutineDefinition::new("r").with_session("routine:r", TTL);

        let err = resolver.resolve(&def).await.unwrap_err();
        assert!(matches!(err, RoostError::StoreUnavailable(_)));
    }
}
