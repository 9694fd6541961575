//! Claude CLI as a completion backend.

use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use super::backend::{CompletionBackend, CompletionRequest};
use super::retry::retry_with_backoff;
use crate::error::CompletionError;

const CLAUDE_BINARY: &str = "claude";

/// Check if Claude Code CLI is installed and accessible.
///
/// Uses the `which` crate for cross-platform executable detection.
pub fn check_claude_installed() -> Result<(), CompletionError> {
    which::which(CLAUDE_BINARY)
        .map(|_| ())
        .map_err(|_| CompletionError::NotInstalled)
}

/// Runs `claude -p` for each request.
///
/// No own timeout: the caller bounds each completion.
#[derive(Debug, Clone)]
pub struct ClaudeCliBackend {
    binary: String,
}

impl Default for ClaudeCliBackend {
    fn default() -> Self {
        Self {
            binary: CLAUDE_BINARY.to_string(),
        }
    }
}

impl ClaudeCliBackend {
    /// Use a different executable (tests point this at a shell script).
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run_once(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let mut command = Command::new(&self.binary);
        command.arg("-p").arg(&request.prompt);
        if let Some(system) = request.system_prompt.as_deref() {
            command.arg("--append-system-prompt").arg(system);
        }

        let output = command
            .arg("--output-format")
            .arg("json")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => CompletionError::NotInstalled,
                _ => CompletionError::SpawnFailed(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let code = output.status.code().unwrap_or(-1);
            return Err(CompletionError::NonZeroExit { code, stderr });
        }

        parse_claude_response(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Claude CLI JSON envelope when using --output-format json
#[derive(Deserialize)]
struct ClaudeCliResponse {
    result: String,
    #[serde(default)]
    is_error: bool,
}

/// Unwrap the CLI envelope; anything that is not an envelope is taken as-is.
fn parse_claude_response(response: &str) -> Result<String, CompletionError> {
    match serde_json::from_str::<ClaudeCliResponse>(response) {
        Ok(envelope) if envelope.is_error => Err(CompletionError::ExecutionFailed(envelope.result)),
        Ok(envelope) => Ok(envelope.result),
        Err(_) => Ok(response.to_string()),
    }
}

fn is_retryable(err: &CompletionError) -> bool {
    matches!(
        err,
        CompletionError::NonZeroExit { .. } | CompletionError::ExecutionFailed(_)
    )
}

#[async_trait]
impl CompletionBackend for ClaudeCliBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        retry_with_backoff(
            || self.run_once(request),
            is_retryable,
            |e| CompletionError::RetriesExhausted(Box::new(e)),
        )
        .await
    }
}
