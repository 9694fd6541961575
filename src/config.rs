//! Environment-derived configuration.
//!
//! Every value has a default; malformed values are logged and replaced by
//! the default rather than failing the run. The only hard precondition
//! (a remote vector store without an endpoint) is checked when the store
//! connects, see [`crate::search::HelixStore::connect`].

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::llm::{Provider, ProviderSelection};

/// Default local HelixDB address.
pub const DEFAULT_LOCAL_ENDPOINT: &str = "http://localhost:6969";

pub const HELIX_LOCAL_VAR: &str = "HELIX_LOCAL";
pub const HELIX_ENDPOINT_VAR: &str = "HELIX_ENDPOINT";
const HELIX_API_KEY_VAR: &str = "HELIX_API_KEY";

const VOYAGE_API_KEY_VAR: &str = "VOYAGE_API_KEY";
const VOYAGE_MODEL_VAR: &str = "VOYAGE_MODEL";
const VOYAGE_BASE_URL_VAR: &str = "VOYAGE_BASE_URL";
const DEFAULT_VOYAGE_MODEL: &str = "voyage-code-3";
const DEFAULT_VOYAGE_BASE_URL: &str = "https://api.voyageai.com";

const CEREBRAS_API_KEY_VAR: &str = "CEREBRAS_API_KEY";
const CEREBRAS_MODEL_VAR: &str = "CEREBRAS_MODEL";
const CEREBRAS_BASE_URL_VAR: &str = "CEREBRAS_BASE_URL";
const DEFAULT_CEREBRAS_MODEL: &str = "llama-3.3-70b";
const DEFAULT_CEREBRAS_BASE_URL: &str = "https://api.cerebras.ai";

const PROVIDER_VAR: &str = "GLIDE_LLM_PROVIDER";

const EMBED_TIMEOUT_VAR: &str = "GLIDE_EMBED_TIMEOUT";
const QUERY_TIMEOUT_VAR: &str = "GLIDE_QUERY_TIMEOUT";
const COMPLETION_TIMEOUT_VAR: &str = "GLIDE_COMPLETION_TIMEOUT";
const DEFAULT_EMBED_TIMEOUT_SECS: u64 = 5;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 5;
const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 30;

const CONCURRENCY_VAR: &str = "GLIDE_MAX_CONCURRENCY";
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Which vector store deployment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    Local,
    Remote,
}

/// Vector store connection settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub mode: StoreMode,
    /// Required in remote mode; overrides the default address in local mode.
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

/// Embedding backend settings.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

/// HTTP completion backend settings.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub providers: ProviderSelection,
}

/// Per-call ceilings for the three external services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub embed: Duration,
    pub query: Duration,
    pub completion: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            embed: Duration::from_secs(DEFAULT_EMBED_TIMEOUT_SECS),
            query: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            completion: Duration::from_secs(DEFAULT_COMPLETION_TIMEOUT_SECS),
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreConfig,
    pub embedding: EmbeddingConfig,
    pub completion: CompletionConfig,
    pub timeouts: Timeouts,
    pub max_concurrency: usize,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        let mode = if read_flag(HELIX_LOCAL_VAR, true) {
            StoreMode::Local
        } else {
            StoreMode::Remote
        };

        Self {
            store: StoreConfig {
                mode,
                endpoint: read_optional(HELIX_ENDPOINT_VAR),
                api_key: read_optional(HELIX_API_KEY_VAR),
            },
            embedding: EmbeddingConfig {
                api_key: read_optional(VOYAGE_API_KEY_VAR),
                model: read_or(VOYAGE_MODEL_VAR, DEFAULT_VOYAGE_MODEL),
                base_url: read_or(VOYAGE_BASE_URL_VAR, DEFAULT_VOYAGE_BASE_URL),
            },
            completion: CompletionConfig {
                api_key: read_optional(CEREBRAS_API_KEY_VAR),
                model: read_or(CEREBRAS_MODEL_VAR, DEFAULT_CEREBRAS_MODEL),
                base_url: read_or(CEREBRAS_BASE_URL_VAR, DEFAULT_CEREBRAS_BASE_URL),
                providers: read_provider(),
            },
            timeouts: Timeouts {
                embed: read_timeout(EMBED_TIMEOUT_VAR, DEFAULT_EMBED_TIMEOUT_SECS),
                query: read_timeout(QUERY_TIMEOUT_VAR, DEFAULT_QUERY_TIMEOUT_SECS),
                completion: read_timeout(COMPLETION_TIMEOUT_VAR, DEFAULT_COMPLETION_TIMEOUT_SECS),
            },
            max_concurrency: read_concurrency(),
        }
    }
}

fn read_optional(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_or(var: &str, default: &str) -> String {
    read_optional(var).unwrap_or_else(|| default.to_string())
}

/// Parse a boolean flag, accepting true/false, 1/0, yes/no, on/off.
fn read_flag(var: &str, default: bool) -> bool {
    match read_optional(var) {
        None => default,
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                warn!("Invalid {} value '{}', using default {}", var, v, default);
                default
            }
        },
    }
}

/// Get a timeout in whole seconds from `var`, falling back to `default_secs`.
///
/// Logs a warning if the variable is set but not a positive integer.
fn read_timeout(var: &str, default_secs: u64) -> Duration {
    match read_optional(var) {
        Some(v) => match v.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!("Invalid {} value '{}', using default {}s", var, v, default_secs);
                Duration::from_secs(default_secs)
            }
        },
        None => Duration::from_secs(default_secs),
    }
}

fn read_concurrency() -> usize {
    match read_optional(CONCURRENCY_VAR) {
        Some(v) => match v.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                warn!(
                    "Invalid {} value '{}', using default {}",
                    CONCURRENCY_VAR, v, DEFAULT_MAX_CONCURRENCY
                );
                DEFAULT_MAX_CONCURRENCY
            }
        },
        None => DEFAULT_MAX_CONCURRENCY,
    }
}

fn read_provider() -> ProviderSelection {
    match read_optional(PROVIDER_VAR) {
        Some(v) => match v.parse::<Provider>() {
            Ok(primary) => ProviderSelection::from_primary(primary),
            Err(e) => {
                warn!("{}, using default provider", e);
                ProviderSelection::default()
            }
        },
        None => ProviderSelection::default(),
    }
}
