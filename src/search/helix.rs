//! HelixDB vector store over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::{DEFAULT_LOCAL_ENDPOINT, HELIX_ENDPOINT_VAR, HELIX_LOCAL_VAR, StoreConfig, StoreMode};
use crate::error::{ConfigError, SearchError};

/// A named-query vector store.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn query(&self, name: &str, params: Value) -> Result<Value, SearchError>;
}

/// Connection to a local or remote HelixDB instance.
///
/// One per pipeline run; the underlying client pools connections.
#[derive(Debug, Clone)]
pub struct HelixStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

const CONNECT_TIMEOUT_SECS: u64 = 5;

impl HelixStore {
    /// Resolve the endpoint for `config.mode` and build the client.
    ///
    /// Remote mode without an endpoint is a hard error. No request is sent.
    pub fn connect(config: &StoreConfig) -> Result<Self, ConfigError> {
        let endpoint = match config.mode {
            StoreMode::Local => config
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_LOCAL_ENDPOINT.to_string()),
            StoreMode::Remote => config.endpoint.clone().ok_or(ConfigError::MissingEndpoint {
                var: HELIX_ENDPOINT_VAR,
                mode_var: HELIX_LOCAL_VAR,
            })?,
        };

        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidEndpoint(endpoint));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        debug!("Vector store endpoint: {}", endpoint);
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl VectorStore for HelixStore {
    async fn query(&self, name: &str, params: Value) -> Result<Value, SearchError> {
        let url = format!("{}/{}", self.endpoint, name);
        let mut request = self.client.post(&url).json(&params);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                query: name.to_string(),
                status,
                message: text,
            });
        }

        resp.json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: StoreMode, endpoint: Option<&str>) -> StoreConfig {
        StoreConfig {
            mode,
            endpoint: endpoint.map(str::to_string),
            api_key: None,
        }
    }

    #[test]
    fn test_local_mode_defaults_endpoint() {
        let store = HelixStore::connect(&config(StoreMode::Local, None)).unwrap();
        assert_eq!(store.endpoint(), DEFAULT_LOCAL_ENDPOINT);
    }

    #[test]
    fn test_local_mode_honours_override() {
        let store =
            HelixStore::connect(&config(StoreMode::Local, Some("http://127.0.0.1:7000/"))).unwrap();
        assert_eq!(store.endpoint(), "http://127.0.0.1:7000");
    }

    #[test]
    fn test_remote_mode_requires_endpoint() {
        let err = HelixStore::connect(&config(StoreMode::Remote, None)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEndpoint { .. }));
        assert!(err.to_string().contains(HELIX_ENDPOINT_VAR));
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let err =
            HelixStore::connect(&config(StoreMode::Remote, Some("helix.example.com"))).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint(_)));
    }
}
