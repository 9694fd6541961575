//! Async `git` subprocess runner.
//!
//! Every invocation closes stdin and captures stdout/stderr: the host
//! process's own stdio may be its caller-facing protocol channel, so a child
//! must never read from or write to it.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use tokio::process::Command;
use tracing::debug;

use crate::error::GitError;

/// Handle on a repository worktree, driven through the system `git` binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    /// Use `root` as the repository worktree without probing it.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the worktree root containing `dir` via `git rev-parse --show-toplevel`.
    pub async fn discover(dir: impl AsRef<Path>) -> Result<Self, GitError> {
        if which::which("git").is_err() {
            return Err(GitError::NotInstalled);
        }

        let dir = dir.as_ref();
        let probe = Self::at(dir);
        let output = probe.output(&["rev-parse", "--show-toplevel"]).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::NotARepository(format!(
                "{}: {}",
                dir.display(),
                stderr.trim()
            )));
        }

        let root = decode("rev-parse", output.stdout)?;
        Ok(Self::at(root.trim()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run a git command that must exit with status 0; returns stdout.
    pub async fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.output(args).await?;
        if !output.status.success() {
            return Err(non_zero(args, &output));
        }
        decode(subcommand(args), output.stdout)
    }

    /// Run a `git diff` style command: exit 1 means "differences found".
    async fn run_diff(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.output(args).await?;
        if output.status.code().unwrap_or(2) > 1 {
            return Err(non_zero(args, &output));
        }
        decode(subcommand(args), output.stdout)
    }

    async fn output(&self, args: &[&str]) -> Result<Output, GitError> {
        debug!("git {}", args.join(" "));
        Command::new("git")
            .args(["-c", "core.quotepath=off"])
            .args(args)
            .current_dir(&self.root)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_LITERAL_PATHSPECS", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(GitError::SpawnFailed)
    }

    /// Paths with changes staged in the index.
    ///
    /// Renames are listed as a deletion plus an addition so both sides get committed.
    pub async fn staged_paths(&self) -> Result<Vec<String>, GitError> {
        let out = self
            .run_diff(&["diff", "--cached", "--no-renames", "--name-only", "-z"])
            .await?;
        Ok(split_nul(&out))
    }

    /// Paths with unstaged changes in the worktree.
    pub async fn unstaged_paths(&self) -> Result<Vec<String>, GitError> {
        let out = self.run_diff(&["diff", "--no-renames", "--name-only", "-z"]).await?;
        Ok(split_nul(&out))
    }

    /// Untracked paths that are not ignored.
    pub async fn untracked_paths(&self) -> Result<Vec<String>, GitError> {
        let out = self
            .run(&["ls-files", "--others", "--exclude-standard", "-z"])
            .await?;
        Ok(split_nul(&out))
    }

    /// Staged diff text for one path (empty when nothing is staged).
    pub async fn staged_diff(&self, path: &str) -> Result<String, GitError> {
        self.run_diff(&[
            "diff",
            "--cached",
            "--no-renames",
            "--no-color",
            "--no-ext-diff",
            "--",
            path,
        ])
        .await
    }

    /// Unstaged diff text for one path (empty when the worktree matches the index).
    pub async fn unstaged_diff(&self, path: &str) -> Result<String, GitError> {
        self.run_diff(&["diff", "--no-renames", "--no-color", "--no-ext-diff", "--", path])
            .await
    }

    /// Stage additions, modifications and deletions of exactly `path`.
    ///
    /// A path missing from the worktree may already be gone from the index
    /// too (the old side of a staged rename), where `git add` would reject it.
    pub async fn stage(&self, path: &str) -> Result<(), GitError> {
        let on_disk = tokio::fs::symlink_metadata(self.root.join(path)).await.is_ok();
        let args: &[&str] = if on_disk {
            &["add", "-A", "--", path]
        } else {
            &["rm", "--cached", "--quiet", "--ignore-unmatch", "--", path]
        };
        self.run(args).await.map(|_| ())
    }

    /// Commit only `path`, leaving anything else in the index untouched.
    pub async fn commit_path(&self, path: &str, message: &str) -> Result<(), GitError> {
        self.run(&["commit", "--quiet", "-m", message, "--", path])
            .await
            .map(|_| ())
    }
}

fn subcommand<'a>(args: &[&'a str]) -> &'a str {
    args.first().copied().unwrap_or("")
}

fn non_zero(args: &[&str], output: &Output) -> GitError {
    GitError::NonZeroExit {
        command: subcommand(args).to_string(),
        code: output.status.code().unwrap_or(-1),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

fn decode(command: &str, bytes: Vec<u8>) -> Result<String, GitError> {
    String::from_utf8(bytes).map_err(|_| GitError::InvalidOutput {
        command: command.to_string(),
    })
}

fn split_nul(out: &str) -> Vec<String> {
    out.split('\0')
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
