//! # roost-store
//!
//! The session store: a typed wrapper over a key-value store with per-key
//! expiry. Holds opaque resumable-conversation blobs under string keys.
//! No business logic lives here — absence-on-read is a normal condition
//! (first run, or TTL expiry), and all backends are safe for concurrent
//! access from multiple simultaneous invocations.

pub mod memory;
pub mod sqlite;
pub mod store;

pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;
pub use store::{HUMAN_SESSION_KEY, HUMAN_SESSION_TTL, SessionStore};
