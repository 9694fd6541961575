//! Diff embedding: language detection, chunking, and the embedding backend.

pub mod chunk;
pub mod client;
pub mod language;
pub mod voyage;

pub use client::{Embedding, EmbeddingBackend, EmbeddingClient};
pub use language::Language;
pub use voyage::VoyageBackend;
