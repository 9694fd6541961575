//! glide - Split a working tree into one commit per file.
//!
//! # Overview
//!
//! glide collects a diff for every changed file, embeds it, retrieves
//! similar historical diffs from a vector store as exemplars, asks an LLM
//! for a conventional commit title, and commits each file on its own.

pub mod commit;
pub mod config;
pub mod embedding;
pub mod error;
pub mod git;
pub mod llm;
pub mod search;

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

// Re-export commonly used types
pub use commit::{CommitReport, SplitOutcome, SplitPipeline};
pub use config::Config;
pub use error::{CommitFailure, ConfigError, GitError, SplitError};

use embedding::{EmbeddingClient, VoyageBackend};
use llm::{CerebrasBackend, ClaudeCliBackend, LlmRouter};
use search::HelixStore;

/// Wire the production collaborators for the repository containing `repo_dir`.
///
/// The vector store endpoint is validated before the repository is touched.
pub async fn pipeline_from_config(repo_dir: &Path, config: &Config) -> Result<SplitPipeline, SplitError> {
    let store = HelixStore::connect(&config.store)?;
    let git = git::GitCli::discover(repo_dir).await?;
    debug!("Repository root: {}", git.root().display());

    let embedder = EmbeddingClient::new(Arc::new(VoyageBackend::new(&config.embedding)));
    if llm::check_claude_installed().is_err() {
        debug!("Claude CLI not found; completions have no working fallback");
    }
    let router = LlmRouter::new(
        config.completion.providers,
        Arc::new(CerebrasBackend::new(&config.completion)),
        Arc::new(ClaudeCliBackend::default()),
    );
    let synthesizer = commit::MessageSynthesizer::new(Arc::new(router), config.timeouts.completion);

    Ok(SplitPipeline::new(git, embedder, Arc::new(store), synthesizer)
        .with_timeouts(config.timeouts)
        .with_max_concurrency(config.max_concurrency))
}

/// Split the working tree containing `repo_dir` into per-file commits.
///
/// Returns an informational message, the JSON commit report, or a
/// diagnostic; never an error.
pub async fn split_commit(repo_dir: &Path, config: &Config) -> String {
    match pipeline_from_config(repo_dir, config).await {
        Ok(pipeline) => pipeline.split_commit().await,
        Err(e) => commit::render_result(Err(e)),
    }
}
