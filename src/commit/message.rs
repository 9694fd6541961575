//! Commit message synthesis with timeout and fallback.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::commit::prompt::{SYSTEM_PROMPT, build_user_prompt};
use crate::llm::{CompletionBackend, CompletionRequest};

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 64;

/// The message used whenever no model-written title is available.
pub fn fallback_message(file_path: &str) -> String {
    let basename = Path::new(file_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.to_string());
    format!("Update {basename}")
}

/// First line of a model response, trimmed; `None` if that is empty.
pub fn first_line(response: &str) -> Option<String> {
    response
        .trim()
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}

/// Produces one commit title per file from its diff and exemplars.
#[derive(Clone)]
pub struct MessageSynthesizer {
    backend: Arc<dyn CompletionBackend>,
    timeout: Duration,
}

impl MessageSynthesizer {
    pub fn new(backend: Arc<dyn CompletionBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Never returns an empty string: errors, timeouts and blank responses
    /// all yield [`fallback_message`].
    pub async fn synthesize(&self, diff_text: &str, exemplars: &str, file_path: &str) -> String {
        let request = CompletionRequest::new(build_user_prompt(file_path, diff_text, exemplars))
            .with_system_prompt(SYSTEM_PROMPT)
            .with_temperature(TEMPERATURE)
            .with_max_tokens(MAX_TOKENS);

        let response = match timeout(self.timeout, self.backend.complete(&request)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!("Completion failed for {}: {}", file_path, e);
                return fallback_message(file_path);
            }
            Err(_) => {
                warn!(
                    "Completion for {} timed out after {}s",
                    file_path,
                    self.timeout.as_secs()
                );
                return fallback_message(file_path);
            }
        };

        match first_line(&response) {
            Some(message) => message,
            None => {
                debug!("Empty completion for {}, using fallback", file_path);
                fallback_message(file_path)
            }
        }
    }
}
