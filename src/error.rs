//! Error types for glide modules using thiserror.

use thiserror::Error;

use crate::commit::report::CommitReport;

/// Errors from `git` subprocess invocations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("git executable not found on PATH")]
    NotInstalled,

    #[error("Failed to spawn git: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("git {command} exited with code {code}: {stderr}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("git {command} produced output that is not valid UTF-8")]
    InvalidOutput { command: String },

    #[error("Not a git repository: {0}")]
    NotARepository(String),
}

/// Errors from walking repository history with git2.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Failed to walk commit history: {0}")]
    RevwalkError(#[source] git2::Error),

    #[error("Failed to compute diff for commit {commit}: {source}")]
    DiffFailed {
        commit: String,
        #[source]
        source: git2::Error,
    },
}

/// Errors from the embedding backend.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("No embedding API key configured (set VOYAGE_API_KEY)")]
    MissingApiKey,

    #[error("Nothing to embed: diff text is empty")]
    EmptyInput,

    #[error("Embedding request failed: {0}")]
    Http(String),

    #[error("Embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Embedding API returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for EmbedError {
    fn from(err: reqwest::Error) -> Self {
        EmbedError::Http(err.to_string())
    }
}

/// Errors from language-aware chunking. Always recovered by token chunking.
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("Cannot chunk empty text")]
    Empty,

    #[error("Invalid definition pattern for {language}: {message}")]
    Pattern {
        language: &'static str,
        message: String,
    },
}

/// Errors from the vector store.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Vector store request failed: {0}")]
    Http(String),

    #[error("Vector store query '{query}' failed (status {status}): {message}")]
    Api {
        query: String,
        status: u16,
        message: String,
    },

    #[error("Vector store returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Http(err.to_string())
    }
}

/// Errors from completion backends.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("No completion API key configured (set CEREBRAS_API_KEY)")]
    MissingApiKey,

    #[error("Completion request failed: {0}")]
    Http(String),

    #[error("Completion API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Completion API rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Completion backend returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("Claude Code CLI not found. Install with: npm install -g @anthropic-ai/claude-code")]
    NotInstalled,

    #[error("Failed to spawn Claude process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Claude CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Claude CLI reported an error: {0}")]
    ExecutionFailed(String),

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<CompletionError>),

    #[error("Both completion providers failed. {primary} error: {primary_error}. {fallback} error: {fallback_error}.")]
    AllProvidersFailed {
        primary: crate::llm::Provider,
        primary_error: Box<CompletionError>,
        fallback: crate::llm::Provider,
        fallback_error: Box<CompletionError>,
    },
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Http(err.to_string())
    }
}

impl CompletionError {
    /// Whether a retry has a reasonable chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            CompletionError::Http(_) | CompletionError::RateLimited { .. } => true,
            CompletionError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Configuration problems detected before any file is processed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} must be set when {mode_var} selects the remote vector store")]
    MissingEndpoint {
        var: &'static str,
        mode_var: &'static str,
    },

    #[error("Invalid vector store endpoint '{0}': must start with http:// or https://")]
    InvalidEndpoint(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// A stage or commit step failed for one file. Halts the run.
#[derive(Error, Debug)]
#[error("Failed to commit '{file}' with message '{message}': {source}")]
pub struct CommitFailure {
    pub file: String,
    pub message: String,
    #[source]
    pub source: GitError,
}

/// Run-level errors of the split pipeline.
#[derive(Error, Debug)]
pub enum SplitError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Git(#[from] GitError),

    #[error("{failure}")]
    Commit {
        failure: CommitFailure,
        /// Commits applied before the failure; they are not rolled back.
        completed: CommitReport,
    },

    #[error("Enrichment task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SplitError {
    /// Short category name used in diagnostic strings.
    pub fn category(&self) -> &'static str {
        match self {
            SplitError::Config(_) => "config",
            SplitError::Git(_) => "git",
            SplitError::Commit { .. } => "commit",
            SplitError::Task(e) if e.is_panic() => "panic",
            SplitError::Task(_) => "task",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_failure_names_file_message_and_cause() {
        let failure = CommitFailure {
            file: "src/b.rs".to_string(),
            message: "fix: handle empty input".to_string(),
            source: GitError::NonZeroExit {
                command: "commit".to_string(),
                code: 1,
                stderr: "hook rejected".to_string(),
            },
        };
        let text = failure.to_string();
        assert!(text.contains("src/b.rs"));
        assert!(text.contains("fix: handle empty input"));
        assert!(text.contains("hook rejected"));
    }

    #[test]
    fn test_transient_completion_errors() {
        assert!(CompletionError::Http("reset".into()).is_transient());
        assert!(CompletionError::RateLimited { retry_after_secs: Some(1) }.is_transient());
        assert!(CompletionError::Api { status: 503, message: String::new() }.is_transient());
        assert!(!CompletionError::Api { status: 400, message: String::new() }.is_transient());
        assert!(!CompletionError::MissingApiKey.is_transient());
    }

    #[test]
    fn test_split_error_categories() {
        let config = SplitError::from(ConfigError::MissingEndpoint {
            var: "HELIX_ENDPOINT",
            mode_var: "HELIX_LOCAL",
        });
        assert_eq!(config.category(), "config");

        let git = SplitError::from(GitError::NotInstalled);
        assert_eq!(git.category(), "git");
    }
}
