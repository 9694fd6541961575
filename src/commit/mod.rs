//! Splitting a working tree into one commit per file.

pub mod diff;
pub mod executor;
pub mod message;
pub mod pipeline;
pub mod prompt;
pub mod report;

pub use diff::{FileDiff, collect, synthesize_new_file_diff};
pub use executor::CommitExecutor;
pub use message::{MessageSynthesizer, fallback_message};
pub use pipeline::{FileState, SplitOutcome, SplitPipeline, render_result};
pub use report::{CommitEntry, CommitReport};
