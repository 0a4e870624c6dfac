use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use roost_core::{Result, RoostError};

use crate::store::SessionStore;

/// SQLite-backed session store. The default production backend: requires
/// no external services and persists across restarts. WAL mode keeps
/// concurrent readers from blocking the writer.
pub struct SqliteSessionStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteSessionStore {
    /// Open or create the session database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        info!(?path, "opening session store");

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|e| RoostError::Store(e.to_string()))?;
        Self::init(conn)
    }

    /// Fully in-memory database. Used by tests and the `memory`-ish dev
    /// path that still wants SQL semantics.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| RoostError::Store(e.to_string()))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| RoostError::Store(e.to_string()))?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sessions (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_expiry ON sessions(expires_at);
            ",
        )
        .map_err(|e| RoostError::Store(e.to_string()))?;

        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    fn now_millis() -> i64 {
        Utc::now().timestamp_millis()
    }

    fn deadline(ttl: Duration) -> i64 {
        Self::now_millis() + ttl.as_millis() as i64
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let db = self.db.lock();
        let row: Option<(String, i64)> = db
            .query_row(
                "SELECT value, expires_at FROM sessions WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| RoostError::Store(e.to_string()))?;

        match row {
            Some((_, expires_at)) if expires_at <= Self::now_millis() => {
                // Lazy expiry: drop the stale row on read.
                db.execute("DELETE FROM sessions WHERE key = ?1", params![key])
                    .map_err(|e| RoostError::Store(e.to_string()))?;
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let db = self.db.lock();
        db.execute(
            "INSERT INTO sessions (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
            params![key, value, Self::deadline(ttl)],
        )
        .map_err(|e| RoostError::Store(e.to_string()))?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let db = self.db.lock();
        let changed = db
            .execute(
                "UPDATE sessions SET expires_at = ?2 WHERE key = ?1 AND expires_at > ?3",
                params![key, Self::deadline(ttl), Self::now_millis()],
            )
            .map_err(|e| RoostError::Store(e.to_string()))?;
        Ok(changed > 0)
    }
}
