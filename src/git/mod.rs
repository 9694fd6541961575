//! Git access: the `git` binary for worktree operations, git2 for history.

pub mod command;
pub mod history;

pub use command::GitCli;
pub use history::{HistoricalDiff, index_repository};
