//! Completion providers and routing between them.

pub mod backend;
pub mod cerebras;
pub mod claude;
pub mod retry;
pub mod router;

pub use backend::{CompletionBackend, CompletionRequest};
pub use cerebras::CerebrasBackend;
pub use claude::{ClaudeCliBackend, check_claude_installed};
pub use router::{LlmRouter, Provider, ProviderSelection};
