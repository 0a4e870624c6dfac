use thiserror::Error;

/// Unified error type for the entire Roost runtime.
#[derive(Error, Debug)]
pub enum RoostError {
    // ── Registry errors ────────────────────────────────────────
    #[error("unknown routine: {name}. Available: {available}")]
    RoutineNotFound { name: String, available: String },

    #[error("routine already registered: {0}")]
    DuplicateRoutine(String),

    #[error("invalid routine config: {routine}: {reason}")]
    InvalidRoutineConfig { routine: String, reason: String },

    // ── Session store errors ───────────────────────────────────
    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("session store error: {0}")]
    Store(String),

    // ── Routine-author errors ──────────────────────────────────
    #[error("prompt build failed: {routine}: {reason}")]
    RoutineBuild { routine: String, reason: String },

    #[error("output handler failed: {routine}: {reason}")]
    RoutineOutput { routine: String, reason: String },

    // ── Engine errors ──────────────────────────────────────────
    #[error("engine execution failed: {0}")]
    EngineExecution(String),

    // ── Commit errors (degraded, never fails the run) ──────────
    #[error("session commit failed: {key}: {reason}")]
    SessionCommit { key: String, reason: String },

    // ── Config errors ──────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RoostError>;
