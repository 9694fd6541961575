//! Embedding client: chunk a diff and embed the chunks in one batch.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::chunk::{TOKEN_CHUNK_SIZE, code_chunk, token_chunk};
use super::language::Language;
use crate::error::EmbedError;

/// A single embedding vector.
pub type Embedding = Vec<f32>;

/// Turns a batch of texts into one vector per text, in input order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Embedding>, EmbedError>;
}

#[derive(Clone)]
pub struct EmbeddingClient {
    backend: Arc<dyn EmbeddingBackend>,
}

impl EmbeddingClient {
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self { backend }
    }

    /// Embed the diff of `file_path`.
    ///
    /// Chunks with the language-aware splitter when the extension is known,
    /// otherwise (or when that fails) with token windows.
    pub async fn embed(&self, diff_text: &str, file_path: &str) -> Result<Vec<Embedding>, EmbedError> {
        let chunks = chunk_for_path(diff_text, file_path);
        if chunks.is_empty() {
            return Err(EmbedError::EmptyInput);
        }

        debug!("Embedding {} chunk(s) for {}", chunks.len(), file_path);
        let vectors = self.backend.embed_batch(&chunks).await?;
        if vectors.len() != chunks.len() {
            return Err(EmbedError::InvalidResponse(format!(
                "expected {} vectors, got {}",
                chunks.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

/// Pick a chunking strategy for `file_path` and apply it.
pub fn chunk_for_path(diff_text: &str, file_path: &str) -> Vec<String> {
    if let Some(language) = Language::from_path(file_path) {
        match code_chunk(diff_text, language) {
            Ok(chunks) => return chunks,
            Err(e) => debug!(
                "{} chunking failed for {}, using token chunks: {}",
                language, file_path, e
            ),
        }
    }
    token_chunk(diff_text, TOKEN_CHUNK_SIZE)
}
