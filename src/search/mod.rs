//! Similarity search against the vector store of historical diffs.

pub mod exemplar;
pub mod helix;

use serde_json::json;
use tracing::debug;

use crate::error::SearchError;

pub use exemplar::{MAX_EXEMPLARS, SimilarityExample, extract_exemplars, render_exemplars};
pub use helix::{HelixStore, VectorStore};

/// Neighbours requested per query.
pub const SIMILAR_K: usize = 8;

/// Stored query returning the nearest historical diffs to a vector.
pub const SIMILAR_DIFFS_QUERY: &str = "getSimilarDiffsByVector";

/// Nearest historical diff rows to `vector`, in store order.
pub async fn find_similar(
    store: &dyn VectorStore,
    vector: &[f32],
    k: usize,
) -> Result<Vec<serde_json::Value>, SearchError> {
    let response = store
        .query(SIMILAR_DIFFS_QUERY, json!({ "vector": vector, "k": k }))
        .await?;
    let rows = exemplar::rows(response);
    debug!("Vector store returned {} row(s)", rows.len());
    Ok(rows)
}
