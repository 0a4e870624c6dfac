use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Root configuration — maps to `roost.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoostConfig {
    pub store: StoreConfig,
    pub engine: EngineConfig,
    pub harness: HarnessConfig,
    pub logging: LoggingConfig,
}

// ── Session store ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend: "sqlite" (default, persists across restarts) or "memory"
    /// (ephemeral, for dev).
    pub backend: String,
    /// SQLite database path. Defaults to ~/.roost/sessions.db.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".into(),
            path: None,
        }
    }
}

impl StoreConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".roost")
                .join("sessions.db")
        })
    }
}

// ── Agent engine ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The headless agent CLI to spawn per invocation.
    pub command: String,
    /// Extra args placed before the per-invocation flags.
    pub args: Vec<String>,
    /// Working directory for the engine process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workdir: Option<PathBuf>,
    /// Wall-clock bound on one engine invocation. Exceeding it fails the
    /// run the same way an engine error does.
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: "claude".into(),
            args: vec![],
            workdir: None,
            timeout_secs: 600,
        }
    }
}

impl EngineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ── Harness ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Reference timezone for prompt-context time, e.g.
    /// "America/Los_Angeles".
    pub timezone: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            timezone: "America/Los_Angeles".into(),
        }
    }
}

impl HarnessConfig {
    pub fn tz(&self) -> Result<Tz, String> {
        Tz::from_str(&self.timezone).map_err(|_| format!("unknown timezone: {}", self.timezone))
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when RUST_LOG and --log-level are absent.
    pub level: String,
    /// "pretty" or "json".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl RoostConfig {
    /// Validate the config. Returns warnings for odd-but-workable setups;
    /// errors for configs that cannot run.
    pub fn validate(&self) -> Result<Vec<String>, String> {
        let mut warnings = vec![];

        if self.engine.command.trim().is_empty() {
            return Err("engine.command must not be empty".into());
        }
        if self.engine.timeout_secs == 0 {
            return Err("engine.timeout_secs must be greater than zero".into());
        }
        self.harness.tz()?;

        match self.store.backend.as_str() {
            "sqlite" => {}
            "memory" => {
                warnings.push("store.backend = \"memory\": sessions will not survive restarts".into());
            }
            other => return Err(format!("unknown store backend: {other}")),
        }

        if self.logging.format != "pretty" && self.logging.format != "json" {
            warnings.push(format!(
                "unknown logging format {:?}, falling back to pretty",
                self.logging.format
            ));
        }

        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate_cleanly() {
        let config = RoostConfig::default();
        assert!(config.validate().unwrap().is_empty());
        assert_eq!(config.engine.command, "claude");
        assert_eq!(config.harness.timezone, "America/Los_Angeles");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: RoostConfig = toml::from_str(
            r#"
            [engine]
            command = "agent-cli"
            timeout_secs = 120

            [store]
            backend = "memory"
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.command, "agent-cli");
        assert_eq!(config.engine.timeout(), Duration::from_secs(120));
        assert_eq!(config.store.backend, "memory");
        // Untouched sections keep their defaults.
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_memory_backend_warns() {
        let mut config = RoostConfig::default();
        config.store.backend = "memory".into();
        let warnings = config.validate().unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_bad_timezone_rejected() {
        let mut config = RoostConfig::default();
        config.harness.timezone = "Mars/Olympus_Mons".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = RoostConfig::default();
        config.engine.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let mut config = RoostConfig::default();
        config.store.backend = "etcd".into();
        assert!(config.validate().is_err());
    }
}
