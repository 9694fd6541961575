//! Historical per-file diffs for vector store indexing.
//!
//! Walks local branches with git2 and shapes every commit's file changes into
//! [`HistoricalDiff`] records: the rows an indexer would embed so that
//! [`crate::search`] can later retrieve them as exemplars. Nothing is written.

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use git2::{BranchType, Commit, Delta, Diff, DiffFindOptions, Oid, Patch, Repository, Sort};
use serde::Serialize;

use crate::error::HistoryError;

/// One file's change within one historical commit.
#[derive(Debug, Clone, Serialize)]
pub struct HistoricalDiff {
    pub commit_id: String,
    pub short_id: String,
    pub author: String,
    pub message: String,
    pub committed_at: DateTime<Utc>,
    pub is_merge: bool,
    pub old_path: Option<String>,
    pub new_path: Option<String>,
    /// Single-letter status: A, M, D, R, C, T, ...
    pub status: char,
    pub additions: usize,
    pub deletions: usize,
    /// Unified patch text; empty when the patch is binary or not UTF-8.
    pub patch: String,
}

impl HistoricalDiff {
    /// The path to index this change under (new path, else old path).
    pub fn file_path(&self) -> &str {
        self.new_path
            .as_deref()
            .or(self.old_path.as_deref())
            .unwrap_or("")
    }
}

/// Stable identifier for the repository: the `origin` URL if present,
/// otherwise the canonical worktree path.
pub fn repo_id(repo: &Repository) -> String {
    if let Ok(remote) = repo.find_remote("origin")
        && let Some(url) = remote.url()
        && !url.is_empty()
    {
        return url.to_string();
    }

    let workdir = repo
        .workdir()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| repo.path().to_path_buf());
    std::fs::canonicalize(&workdir)
        .unwrap_or(workdir)
        .display()
        .to_string()
}

/// Local branch names with their tip commit.
pub fn local_branches(repo: &Repository) -> Result<Vec<(String, Oid)>, HistoryError> {
    let mut branches = Vec::new();
    for entry in repo
        .branches(Some(BranchType::Local))
        .map_err(HistoryError::RevwalkError)?
    {
        let (branch, _) = entry.map_err(HistoryError::RevwalkError)?;
        let Some(target) = branch.get().target() else {
            continue;
        };
        let name = branch
            .name()
            .ok()
            .flatten()
            .unwrap_or_default()
            .to_string();
        branches.push((name, target));
    }
    branches.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(branches)
}

/// Commits reachable from `tip`, most recent first.
pub fn branch_commits(repo: &Repository, tip: Oid) -> Result<Vec<Commit<'_>>, HistoryError> {
    let mut revwalk = repo.revwalk().map_err(HistoryError::RevwalkError)?;
    revwalk
        .set_sorting(Sort::TOPOLOGICAL | Sort::TIME)
        .map_err(HistoryError::RevwalkError)?;
    revwalk.push(tip).map_err(HistoryError::RevwalkError)?;

    let mut commits = Vec::new();
    for oid in revwalk {
        let oid = oid.map_err(HistoryError::RevwalkError)?;
        commits.push(repo.find_commit(oid).map_err(HistoryError::RevwalkError)?);
    }
    Ok(commits)
}

/// Per-file diffs of `commit` against its first parent (or the empty tree for
/// a root commit), with renames detected.
pub fn file_diffs(repo: &Repository, commit: &Commit<'_>) -> Result<Vec<HistoricalDiff>, HistoryError> {
    let id = commit.id().to_string();
    let diff_err = |source| HistoryError::DiffFailed {
        commit: id.clone(),
        source,
    };

    let new_tree = commit.tree().map_err(diff_err)?;
    let old_tree = match commit.parent(0) {
        Ok(parent) => Some(parent.tree().map_err(diff_err)?),
        Err(_) => None,
    };

    let mut diff = repo
        .diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), None)
        .map_err(diff_err)?;
    diff.find_similar(Some(DiffFindOptions::new().renames(true)))
        .map_err(diff_err)?;

    let author = format_author(commit);
    let message = commit.message().unwrap_or("").to_string();
    let committed_at = Utc
        .timestamp_opt(commit.time().seconds(), 0)
        .single()
        .unwrap_or_else(Utc::now);
    let is_merge = commit.parent_count() > 1;

    let mut records = Vec::with_capacity(diff.deltas().len());
    for idx in 0..diff.deltas().len() {
        let Some(delta) = diff.get_delta(idx) else {
            continue;
        };
        let (additions, deletions, patch) = patch_stats(&diff, idx);

        records.push(HistoricalDiff {
            commit_id: id.clone(),
            short_id: id.chars().take(12).collect(),
            author: author.clone(),
            message: message.clone(),
            committed_at,
            is_merge,
            old_path: path_string(delta.old_file().path()),
            new_path: path_string(delta.new_file().path()),
            status: status_char(delta.status()),
            additions,
            deletions,
            patch,
        });
    }

    Ok(records)
}

/// Every historical diff on every local branch, keyed for display.
pub fn index_repository(repo_path: &Path) -> Result<Vec<(String, HistoricalDiff)>, HistoryError> {
    let repo = Repository::discover(repo_path).map_err(HistoryError::OpenRepository)?;
    let id = repo_id(&repo);

    let mut rows = Vec::new();
    for (branch, tip) in local_branches(&repo)? {
        let branch_id = format!("{id}:{branch}");
        for commit in branch_commits(&repo, tip)? {
            for record in file_diffs(&repo, &commit)? {
                rows.push((branch_id.clone(), record));
            }
        }
    }
    Ok(rows)
}

fn format_author(commit: &Commit<'_>) -> String {
    let author = commit.author();
    let name = author.name().unwrap_or("");
    match author.email() {
        Some(email) if !email.is_empty() => format!("{name} <{email}>"),
        _ => name.to_string(),
    }
}

fn status_char(status: Delta) -> char {
    match status {
        Delta::Added => 'A',
        Delta::Deleted => 'D',
        Delta::Modified => 'M',
        Delta::Renamed => 'R',
        Delta::Copied => 'C',
        Delta::Typechange => 'T',
        Delta::Ignored => 'I',
        Delta::Untracked => '?',
        Delta::Conflicted => 'U',
        Delta::Unreadable => 'X',
        _ => ' ',
    }
}

fn path_string(path: Option<&Path>) -> Option<String> {
    path.map(|p| p.to_string_lossy().to_string())
}

fn patch_stats(diff: &Diff<'_>, idx: usize) -> (usize, usize, String) {
    let Ok(Some(mut patch)) = Patch::from_diff(diff, idx) else {
        return (0, 0, String::new());
    };
    let (additions, deletions) = patch
        .line_stats()
        .map(|(_, a, d)| (a, d))
        .unwrap_or((0, 0));
    let text = patch
        .to_buf()
        .ok()
        .and_then(|buf| buf.as_str().map(str::to_string))
        .unwrap_or_default();
    (additions, deletions, text)
}
