//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use git2::{Oid, Repository, Signature};
use serde_json::Value;

use glide::commit::{MessageSynthesizer, SplitPipeline};
use glide::embedding::{Embedding, EmbeddingBackend, EmbeddingClient};
use glide::error::{CompletionError, EmbedError, SearchError};
use glide::git::GitCli;
use glide::llm::{CompletionBackend, CompletionRequest};
use glide::search::VectorStore;

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory, with a
    /// repo-local identity so the `git` binary can commit.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
            config.set_bool("commit.gpgsign", false).unwrap();
        }
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn git(&self) -> GitCli {
        GitCli::at(self.path())
    }

    fn signature(&self) -> Signature<'_> {
        Signature::now("Test User", "test@example.com").expect("Failed to create signature")
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&path, content).expect("Failed to write test file");
        path
    }

    pub fn remove(&self, rel: &str) {
        std::fs::remove_file(self.path().join(rel)).expect("Failed to remove test file");
    }

    /// Add `rel` to the index without committing.
    pub fn stage(&self, rel: &str) {
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(rel)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Rename a tracked file in the worktree and the index, like `git mv`.
    pub fn rename(&self, from: &str, to: &str) {
        let status = std::process::Command::new("git")
            .args(["mv", from, to])
            .current_dir(self.path())
            .status()
            .expect("Failed to run git mv");
        assert!(status.success(), "git mv {from} {to} failed");
    }

    /// Write the given files and commit them. Returns the commit OID.
    pub fn commit_files(&self, message: &str, files: &[(&str, &str)]) -> Oid {
        let mut index = self.repo.index().expect("Failed to get index");
        for (rel, content) in files {
            self.write(rel, content);
            index.add_path(Path::new(rel)).expect("Failed to add file");
        }
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let sig = self.signature();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Commit messages from HEAD back to the root, first line only.
    pub fn log_messages(&self) -> Vec<String> {
        let mut revwalk = self.repo.revwalk().expect("Failed to create revwalk");
        if revwalk.push_head().is_err() {
            return Vec::new();
        }
        revwalk
            .map(|oid| {
                let commit = self.repo.find_commit(oid.unwrap()).unwrap();
                commit.summary().unwrap_or("").to_string()
            })
            .collect()
    }

    /// Paths changed by the HEAD commit relative to its parent.
    pub fn head_changed_paths(&self) -> Vec<String> {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        let new_tree = head.tree().unwrap();
        let old_tree = head.parent(0).ok().map(|p| p.tree().unwrap());
        let diff = self
            .repo
            .diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), None)
            .unwrap();
        diff.deltas()
            .filter_map(|d| d.new_file().path().map(|p| p.to_string_lossy().to_string()))
            .collect()
    }

    /// Install an executable hook script under `.git/hooks`.
    #[cfg(unix)]
    pub fn install_hook(&self, name: &str, script: &str) {
        use std::os::unix::fs::PermissionsExt;

        let hooks = self.repo.path().join("hooks");
        std::fs::create_dir_all(&hooks).unwrap();
        let path = hooks.join(name);
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}

/// Returns the same vector for every input.
pub struct FixedEmbedding(pub Vec<f32>);

#[async_trait]
impl EmbeddingBackend for FixedEmbedding {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Embedding>, EmbedError> {
        Ok(inputs.iter().map(|_| self.0.clone()).collect())
    }
}

/// Always unreachable.
pub struct UnreachableEmbedding;

#[async_trait]
impl EmbeddingBackend for UnreachableEmbedding {
    async fn embed_batch(&self, _inputs: &[String]) -> Result<Vec<Embedding>, EmbedError> {
        Err(EmbedError::Http("connection refused".to_string()))
    }
}

/// Never answers within any sane timeout.
pub struct SlowEmbedding;

#[async_trait]
impl EmbeddingBackend for SlowEmbedding {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Embedding>, EmbedError> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok(inputs.iter().map(|_| vec![0.1]).collect())
    }
}

/// Replies with a fixed JSON value and counts queries.
pub struct StaticStore {
    pub reply: Value,
    pub queries: AtomicUsize,
}

impl StaticStore {
    pub fn new(reply: Value) -> Self {
        Self {
            reply,
            queries: AtomicUsize::new(0),
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorStore for StaticStore {
    async fn query(&self, _name: &str, _params: Value) -> Result<Value, SearchError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Counts queries and never answers within any sane timeout.
#[derive(Default)]
pub struct SlowStore {
    pub queries: AtomicUsize,
}

#[async_trait]
impl VectorStore for SlowStore {
    async fn query(&self, _name: &str, _params: Value) -> Result<Value, SearchError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok(Value::Array(Vec::new()))
    }
}

/// Always fails.
pub struct FailingStore;

#[async_trait]
impl VectorStore for FailingStore {
    async fn query(&self, name: &str, _params: Value) -> Result<Value, SearchError> {
        Err(SearchError::Api {
            query: name.to_string(),
            status: 500,
            message: "store down".to_string(),
        })
    }
}

/// Writes `feat: change <path>` using the `File:` line of the prompt and
/// records every prompt it sees.
#[derive(Default)]
pub struct PathCompletion {
    pub prompts: std::sync::Mutex<Vec<String>>,
}

impl PathCompletion {
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionBackend for PathCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let path = request
            .prompt
            .lines()
            .find_map(|l| l.strip_prefix("File: "))
            .unwrap_or("unknown");
        Ok(format!("feat: change {path}\nexplanation that must be dropped"))
    }
}

/// Always fails.
pub struct FailingCompletion;

#[async_trait]
impl CompletionBackend for FailingCompletion {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
        Err(CompletionError::Http("connection refused".to_string()))
    }
}

/// A pipeline over `repo` with the given collaborators and short timeouts.
pub fn pipeline(
    repo: &TestRepo,
    embedding: Arc<dyn EmbeddingBackend>,
    store: Arc<dyn VectorStore>,
    completion: Arc<dyn CompletionBackend>,
) -> SplitPipeline {
    SplitPipeline::new(
        repo.git(),
        EmbeddingClient::new(embedding),
        store,
        MessageSynthesizer::new(completion, Duration::from_secs(5)),
    )
    .with_max_concurrency(2)
}
