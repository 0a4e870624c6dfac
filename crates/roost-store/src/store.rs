use std::time::Duration;

use async_trait::async_trait;
use roost_core::Result;

/// Well-known key where a system outside Roost keeps the human-originated
/// session state. Roost only ever reads it (as a fork source), never
/// writes it.
pub const HUMAN_SESSION_KEY: &str = "routine:human_session";

/// TTL the owning system applies to the human session slot.
pub const HUMAN_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Contract for session storage backends.
///
/// Keys are plain strings, values are opaque blobs. Backends provide their
/// own atomicity for individual `get`/`set` calls; Roost never layers
/// locking on top.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a record. An expired record is a miss, not an error.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a record with a fresh TTL, overwriting any previous value.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Refresh the TTL of a live record. Returns false when the key is
    /// absent or already expired.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;
}
