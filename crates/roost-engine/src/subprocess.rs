use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use roost_core::{Result, RoostError, SessionRecord};

use crate::engine::{AgentEngine, EngineOutcome, EngineRequest};

/// How many trailing bytes of stderr to carry into an error message.
const STDERR_TAIL_BYTES: usize = 2048;

/// Configuration for the subprocess engine.
#[derive(Debug, Clone)]
pub struct SubprocessEngineConfig {
    /// The headless agent CLI to spawn, e.g. "claude".
    pub command: String,
    /// Extra args placed before the per-invocation flags.
    pub base_args: Vec<String>,
    /// Working directory for the child, when set.
    pub workdir: Option<PathBuf>,
}

impl Default for SubprocessEngineConfig {
    fn default() -> Self {
        Self {
            command: "claude".into(),
            base_args: vec![],
            workdir: None,
        }
    }
}

/// Engine integration that spawns a headless agent CLI per invocation and
/// parses a single JSON result document from its stdout. The prompt goes
/// in on stdin; resume/fork/capability hints go in as flags; the
/// invocation label rides an environment variable the CLI attaches as
/// request metadata.
pub struct SubprocessEngine {
    config: SubprocessEngineConfig,
}

impl SubprocessEngine {
    pub fn new(config: SubprocessEngineConfig) -> Self {
        Self { config }
    }
}

/// Per-invocation flags, split out so tests can assert on them without
/// spawning anything.
fn build_args(request: &EngineRequest) -> Vec<String> {
    let mut args = vec![
        "--print".to_string(),
        "--output-format".to_string(),
        "json".to_string(),
    ];
    if let Some(resume) = &request.resume {
        args.push("--resume".to_string());
        args.push(resume.as_str().to_string());
        if request.fork {
            args.push("--fork-session".to_string());
        }
    }
    if !request.allowed_capabilities.is_empty() {
        args.push("--allowed-tools".to_string());
        args.push(request.allowed_capabilities.join(","));
    }
    args
}

/// The result document the agent CLI prints in `--output-format json`.
#[derive(Debug, Deserialize)]
struct ResultDocument {
    #[serde(default)]
    result: String,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    is_error: bool,
}

fn parse_outcome(stdout: &str) -> Result<EngineOutcome> {
    let doc: ResultDocument = serde_json::from_str(stdout.trim())
        .map_err(|e| RoostError::EngineExecution(format!("unparsable engine output: {e}")))?;

    if doc.is_error {
        return Err(RoostError::EngineExecution(format!(
            "engine reported an error: {}",
            doc.result
        )));
    }

    Ok(EngineOutcome {
        result_text: doc.result,
        session: doc.session_id.map(SessionRecord::new),
    })
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let mut start = text.len().saturating_sub(STDERR_TAIL_BYTES);
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].trim().to_string()
}

#[async_trait]
impl AgentEngine for SubprocessEngine {
    async fn execute(&self, request: EngineRequest) -> Result<EngineOutcome> {
        let args = build_args(&request);
        debug!(command = %self.config.command, ?args, label = %request.label, "spawning engine");

        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.base_args)
            .args(&args)
            .env("ROOST_INVOCATION_LABEL", &request.label)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Caller cancellation drops this future; the child must not
            // outlive it and commit work nobody will collect.
            .kill_on_drop(true);
        if let Some(dir) = &self.config.workdir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| {
            RoostError::EngineExecution(format!("failed to spawn {}: {e}", self.config.command))
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RoostError::EngineExecution("engine stdin unavailable".into()))?;
        stdin
            .write_all(request.prompt.as_bytes())
            .await
            .map_err(|e| RoostError::EngineExecution(format!("failed to write prompt: {e}")))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| RoostError::EngineExecution(format!("engine did not exit cleanly: {e}")))?;

        if !output.status.success() {
            return Err(RoostError::EngineExecution(format!(
                "engine exited with {}: {}",
                output.status,
                stderr_tail(&output.stderr)
            )));
        }

        let outcome = parse_outcome(&String::from_utf8_lossy(&output.stdout))?;
        info!(
            label = %request.label,
            chars = outcome.result_text.len(),
            session = outcome.session.as_ref().map(|s| s.short()),
            "engine complete"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_fresh_run() {
        let args = build_args(&EngineRequest {
            prompt: "hello".into(),
            allowed_capabilities: vec![],
            resume: None,
            fork: false,
            label: "routine:notes.daily_summary".into(),
        });
        assert_eq!(args, vec!["--print", "--output-format", "json"]);
    }

    #[test]
    fn test_build_args_resume_with_fork_and_capabilities() {
        let args = build_args(&EngineRequest {
            prompt: "hello".into(),
            allowed_capabilities: vec!["Read".into(), "Bash".into()],
            resume: Some(SessionRecord::new("sess-abc")),
            fork: true,
            label: "routine:notes.handoff".into(),
        });
        assert_eq!(
            args,
            vec![
                "--print",
                "--output-format",
                "json",
                "--resume",
                "sess-abc",
                "--fork-session",
                "--allowed-tools",
                "Read,Bash",
            ]
        );
    }

    #[test]
    fn test_build_args_no_fork_flag_without_resume() {
        // Fork is meaningless with nothing to fork from; the flag must not
        // leak into a fresh run.
        let args = build_args(&EngineRequest {
            prompt: "hello".into(),
            allowed_capabilities: vec![],
            resume: None,
            fork: true,
            label: "routine:notes.handoff".into(),
        });
        assert!(!args.contains(&"--fork-session".to_string()));
    }

    #[test]
    fn test_parse_outcome_success() {
        let outcome =
            parse_outcome(r#"{"result": "all done", "session_id": "sess-123"}"#).unwrap();
        assert_eq!(outcome.result_text, "all done");
        assert_eq!(outcome.session, Some(SessionRecord::new("sess-123")));
    }

    #[test]
    fn test_parse_outcome_without_session() {
        let outcome = parse_outcome(r#"{"result": "ok"}"#).unwrap();
        assert!(outcome.session.is_none());
    }

    #[test]
    fn test_parse_outcome_engine_error() {
        let err = parse_outcome(r#"{"result": "boom", "is_error": true}"#).unwrap_err();
        assert!(matches!(err, RoostError::EngineExecution(_)));
    }

    #[test]
    fn test_parse_outcome_garbage() {
        let err = parse_outcome("not json at all").unwrap_err();
        assert!(matches!(err, RoostError::EngineExecution(_)));
    }
}
