//! The split pipeline: collect, enrich concurrently, commit sequentially.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::commit::diff::{self, FileDiff};
use crate::commit::executor::CommitExecutor;
use crate::commit::message::{MessageSynthesizer, fallback_message};
use crate::commit::report::CommitReport;
use crate::config::{DEFAULT_MAX_CONCURRENCY, Timeouts};
use crate::embedding::EmbeddingClient;
use crate::error::SplitError;
use crate::git::GitCli;
use crate::search::{SIMILAR_K, VectorStore, extract_exemplars, find_similar, render_exemplars};

pub const NO_CHANGES_MESSAGE: &str = "No changes detected in the working tree.";
pub const NO_DIFFS_MESSAGE: &str = "Changes were detected but no diffs could be produced.";
pub const NO_SUGGESTIONS_MESSAGE: &str = "No commit suggestions were generated.";

/// Progress of one file through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Collected,
    Embedded,
    EmbedFailed,
    Queried,
    QueryFailed,
    MessageReady,
    Committed,
    CommitFailed,
}

impl FileState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileState::Collected => "collected",
            FileState::Embedded => "embedded",
            FileState::EmbedFailed => "embed failed",
            FileState::Queried => "queried",
            FileState::QueryFailed => "query failed",
            FileState::MessageReady => "message ready",
            FileState::Committed => "committed",
            FileState::CommitFailed => "commit failed",
        }
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn transition(path: &str, state: FileState) {
    debug!("{}: {}", path, state);
}

/// Successful run outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitOutcome {
    NoChanges,
    NoDiffs,
    NoSuggestions,
    Committed(CommitReport),
}

impl SplitOutcome {
    pub fn render(&self) -> String {
        match self {
            SplitOutcome::NoChanges => NO_CHANGES_MESSAGE.to_string(),
            SplitOutcome::NoDiffs => NO_DIFFS_MESSAGE.to_string(),
            SplitOutcome::NoSuggestions => NO_SUGGESTIONS_MESSAGE.to_string(),
            SplitOutcome::Committed(report) => report.to_json(),
        }
    }
}

/// Render a run result as the single string handed back to the caller.
///
/// Never fails: errors become diagnostic text.
pub fn render_result(result: Result<SplitOutcome, SplitError>) -> String {
    match result {
        Ok(outcome) => outcome.render(),
        Err(SplitError::Commit { failure, completed }) if completed.is_empty() => {
            failure.to_string()
        }
        Err(SplitError::Commit { failure, completed }) => format!(
            "{failure}. {} earlier commit(s) from this run were kept.",
            completed.len()
        ),
        Err(e) => format!("split_commit failed ({}): {}", e.category(), e),
    }
}

/// Per-file enrichment: embed, query, synthesize. Shared by all tasks.
struct Enricher {
    embedder: EmbeddingClient,
    store: Arc<dyn VectorStore>,
    synthesizer: MessageSynthesizer,
    timeouts: Timeouts,
}

impl Enricher {
    async fn suggest(&self, file: &FileDiff) -> String {
        let path = file.path.as_str();
        transition(path, FileState::Collected);

        let Some(vector) = self.embed(file).await else {
            transition(path, FileState::EmbedFailed);
            transition(path, FileState::MessageReady);
            return fallback_message(path);
        };
        transition(path, FileState::Embedded);

        let exemplars = match self.exemplars(path, &vector).await {
            Some(block) => {
                transition(path, FileState::Queried);
                block
            }
            None => {
                transition(path, FileState::QueryFailed);
                String::new()
            }
        };

        let message = self
            .synthesizer
            .synthesize(&file.diff_text, &exemplars, path)
            .await;
        transition(path, FileState::MessageReady);
        message
    }

    /// The query vector for `file`, or `None` on error, timeout or an empty batch.
    async fn embed(&self, file: &FileDiff) -> Option<Vec<f32>> {
        let path = file.path.as_str();
        match timeout(self.timeouts.embed, self.embedder.embed(&file.diff_text, path)).await {
            Ok(Ok(vectors)) => {
                let vector = vectors.into_iter().next().filter(|v| !v.is_empty());
                if vector.is_none() {
                    warn!("Embedding for {} returned no vectors", path);
                }
                vector
            }
            Ok(Err(e)) => {
                warn!("Embedding failed for {}: {}", path, e);
                None
            }
            Err(_) => {
                warn!(
                    "Embedding for {} timed out after {}s",
                    path,
                    self.timeouts.embed.as_secs()
                );
                None
            }
        }
    }

    /// Rendered exemplar block, or `None` on error or timeout.
    async fn exemplars(&self, path: &str, vector: &[f32]) -> Option<String> {
        match timeout(
            self.timeouts.query,
            find_similar(self.store.as_ref(), vector, SIMILAR_K),
        )
        .await
        {
            Ok(Ok(rows)) => Some(render_exemplars(&extract_exemplars(&rows))),
            Ok(Err(e)) => {
                warn!("Similarity query failed for {}: {}", path, e);
                None
            }
            Err(_) => {
                warn!(
                    "Similarity query for {} timed out after {}s",
                    path,
                    self.timeouts.query.as_secs()
                );
                None
            }
        }
    }
}

/// One commit per changed file, with model-written messages.
pub struct SplitPipeline {
    git: GitCli,
    embedder: EmbeddingClient,
    store: Arc<dyn VectorStore>,
    synthesizer: MessageSynthesizer,
    timeouts: Timeouts,
    max_concurrency: usize,
}

impl SplitPipeline {
    pub fn new(
        git: GitCli,
        embedder: EmbeddingClient,
        store: Arc<dyn VectorStore>,
        synthesizer: MessageSynthesizer,
    ) -> Self {
        Self {
            git,
            embedder,
            store,
            synthesizer,
            timeouts: Timeouts::default(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Embed and query ceilings. The completion ceiling belongs to the
    /// [`MessageSynthesizer`].
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn git(&self) -> &GitCli {
        &self.git
    }

    /// Run the pipeline and render the result as a string.
    pub async fn split_commit(&self) -> String {
        render_result(self.run().await)
    }

    pub async fn run(&self) -> Result<SplitOutcome, SplitError> {
        let paths = diff::changed_paths(&self.git).await?;
        if paths.is_empty() {
            info!("{}", NO_CHANGES_MESSAGE);
            return Ok(SplitOutcome::NoChanges);
        }

        let diffs = diff::collect_for_paths(&self.git, &paths).await;
        if diffs.is_empty() {
            info!("{} changed path(s) but no diffs", paths.len());
            return Ok(SplitOutcome::NoDiffs);
        }
        info!("Collected diffs for {} file(s)", diffs.len());

        let suggestions = self.enrich(diffs).await?;
        if suggestions.is_empty() {
            return Ok(SplitOutcome::NoSuggestions);
        }

        let report = self.commit_all(suggestions).await?;
        info!("Created {} commit(s)", report.len());
        Ok(SplitOutcome::Committed(report))
    }

    /// Fan out per-file enrichment, bounded by the semaphore.
    async fn enrich(&self, diffs: BTreeMap<String, FileDiff>) -> Result<BTreeMap<String, String>, SplitError> {
        let enricher = Arc::new(Enricher {
            embedder: self.embedder.clone(),
            store: Arc::clone(&self.store),
            synthesizer: self.synthesizer.clone(),
            timeouts: self.timeouts,
        });
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));

        let mut tasks = JoinSet::new();
        for file in diffs.into_values() {
            let enricher = Arc::clone(&enricher);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // Never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                let message = enricher.suggest(&file).await;
                (file.path, message)
            });
        }

        let mut suggestions = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (path, message) = joined?;
            suggestions.insert(path, message);
        }
        Ok(suggestions)
    }

    /// Commit in path order, stopping at the first failure.
    async fn commit_all(&self, suggestions: BTreeMap<String, String>) -> Result<CommitReport, SplitError> {
        let executor = CommitExecutor::new(&self.git);
        let mut report = CommitReport::default();

        for (file, message) in suggestions {
            if let Err(failure) = executor.commit(&file, &message).await {
                transition(&file, FileState::CommitFailed);
                warn!("{}", failure);
                return Err(SplitError::Commit {
                    failure,
                    completed: report,
                });
            }
            transition(&file, FileState::Committed);
            report.push(file, message);
        }

        Ok(report)
    }
}
