//! Voyage AI embeddings over HTTP.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::client::{Embedding, EmbeddingBackend};
use crate::config::EmbeddingConfig;
use crate::error::EmbedError;

pub struct VoyageBackend {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl VoyageBackend {
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    input: &'a [String],
    model: &'a str,
    input_type: &'static str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedDatum>,
}

#[derive(Deserialize)]
struct EmbedDatum {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[async_trait]
impl EmbeddingBackend for VoyageBackend {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Embedding>, EmbedError> {
        let api_key = self.api_key.as_deref().ok_or(EmbedError::MissingApiKey)?;
        if inputs.is_empty() {
            return Err(EmbedError::EmptyInput);
        }

        let body = EmbedRequest {
            input: inputs,
            model: &self.model,
            input_type: "document",
        };
        let url = format!("{}/v1/embeddings", self.base_url);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(EmbedError::Api {
                status,
                message: text,
            });
        }

        let mut parsed: EmbedResponse = resp
            .json()
            .await
            .map_err(|e| EmbedError::InvalidResponse(e.to_string()))?;

        parsed.data.sort_by_key(|d| d.index);
        if parsed.data.iter().any(|d| d.embedding.is_empty()) {
            return Err(EmbedError::InvalidResponse("empty embedding vector".into()));
        }
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}
