//! Per-file diff collection from the working tree.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::GitError;
use crate::git::GitCli;

/// The diff for one changed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: String,
    pub diff_text: String,
    /// True when the text was synthesized from an untracked file's content.
    pub synthetic: bool,
}

/// Union of staged, unstaged and untracked (not ignored) paths, in path order.
pub async fn changed_paths(git: &GitCli) -> Result<BTreeSet<String>, GitError> {
    let (staged, unstaged, untracked) = tokio::try_join!(
        git.staged_paths(),
        git.unstaged_paths(),
        git.untracked_paths()
    )?;

    Ok(staged
        .into_iter()
        .chain(unstaged)
        .chain(untracked)
        .collect())
}

/// Collect one [`FileDiff`] per path in `paths`.
///
/// Tries the staged diff, then the unstaged diff, then synthesizes a
/// "new file" diff from disk. Paths that produce nothing are dropped.
pub async fn collect_for_paths(
    git: &GitCli,
    paths: &BTreeSet<String>,
) -> BTreeMap<String, FileDiff> {
    let mut diffs = BTreeMap::new();

    for path in paths {
        match diff_for_path(git, path).await {
            Some(diff) => {
                diffs.insert(path.clone(), diff);
            }
            None => debug!("No diff producible for {}, skipping", path),
        }
    }

    diffs
}

/// Enumerate changed paths and collect their diffs.
///
/// An empty map is a normal result (clean tree, or nothing producible).
pub async fn collect(git: &GitCli) -> Result<BTreeMap<String, FileDiff>, GitError> {
    let paths = changed_paths(git).await?;
    Ok(collect_for_paths(git, &paths).await)
}

async fn diff_for_path(git: &GitCli, path: &str) -> Option<FileDiff> {
    for staged in [true, false] {
        let result = if staged {
            git.staged_diff(path).await
        } else {
            git.unstaged_diff(path).await
        };

        match result {
            Ok(text) if !text.trim().is_empty() => {
                return Some(FileDiff {
                    path: path.to_string(),
                    diff_text: text,
                    synthetic: false,
                });
            }
            Ok(_) => {}
            Err(e) => warn!(
                "Failed to read {} diff for {}: {}",
                if staged { "staged" } else { "unstaged" },
                path,
                e
            ),
        }
    }

    let content = read_text(&git.root().join(path)).await?;
    Some(FileDiff {
        path: path.to_string(),
        diff_text: synthesize_new_file_diff(path, &content),
        synthetic: true,
    })
}

async fn read_text(path: &Path) -> Option<String> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) => {
            debug!("Cannot read {}: {}", path.display(), e);
            return None;
        }
    };
    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(_) => {
            debug!("{} is not valid UTF-8 text", path.display());
            None
        }
    }
}

/// Build a whole-file addition diff for an untracked file.
///
/// Every source line becomes one `+` line. Empty files get the header only.
pub fn synthesize_new_file_diff(path: &str, content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();

    let mut diff = format!(
        "diff --git a/{path} b/{path}\nnew file mode 100644\n--- /dev/null\n+++ b/{path}\n"
    );
    if lines.is_empty() {
        return diff;
    }

    diff.push_str(&format!("@@ -0,0 +1,{} @@\n", lines.len()));
    for line in &lines {
        diff.push('+');
        diff.push_str(line);
        diff.push('\n');
    }
    if !content.ends_with('\n') {
        diff.push_str("\\ No newline at end of file\n");
    }
    diff
}
