//! Stage and commit one file at a time.

use tracing::info;

use crate::error::CommitFailure;
use crate::git::GitCli;

/// Applies per-file commits. Calls must not overlap.
pub struct CommitExecutor<'a> {
    git: &'a GitCli,
}

impl<'a> CommitExecutor<'a> {
    pub fn new(git: &'a GitCli) -> Self {
        Self { git }
    }

    /// Stage exactly `file_path`, then commit only that path with `message`.
    pub async fn commit(&self, file_path: &str, message: &str) -> Result<(), CommitFailure> {
        let fail = |source| CommitFailure {
            file: file_path.to_string(),
            message: message.to_string(),
            source,
        };

        self.git.stage(file_path).await.map_err(fail)?;
        self.git.commit_path(file_path, message).await.map_err(fail)?;

        info!("Committed {}: {}", file_path, message);
        Ok(())
    }
}
