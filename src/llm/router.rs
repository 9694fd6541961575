//! Provider selection and fallback orchestration.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::backend::{CompletionBackend, CompletionRequest};
use crate::error::CompletionError;

/// Supported completion providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Cerebras,
    Claude,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Cerebras => "Cerebras",
            Provider::Claude => "Claude",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cerebras" => Ok(Provider::Cerebras),
            "claude" => Ok(Provider::Claude),
            other => Err(format!(
                "Unknown completion provider '{}' (expected cerebras or claude)",
                other
            )),
        }
    }
}

/// Primary + fallback selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSelection {
    pub primary: Provider,
    pub fallback: Provider,
}

impl ProviderSelection {
    pub fn from_primary(primary: Provider) -> Self {
        let fallback = match primary {
            Provider::Cerebras => Provider::Claude,
            Provider::Claude => Provider::Cerebras,
        };
        Self { primary, fallback }
    }

    fn swapped(self) -> Self {
        Self {
            primary: self.fallback,
            fallback: self.primary,
        }
    }
}

impl Default for ProviderSelection {
    fn default() -> Self {
        ProviderSelection::from_primary(Provider::Cerebras)
    }
}

/// Provider router with fallback and stickiness.
///
/// Once the fallback succeeds where the primary failed, the two swap for
/// every later request on this router.
pub struct LlmRouter {
    selection: Mutex<ProviderSelection>,
    cerebras: Arc<dyn CompletionBackend>,
    claude: Arc<dyn CompletionBackend>,
}

impl LlmRouter {
    pub fn new(
        selection: ProviderSelection,
        cerebras: Arc<dyn CompletionBackend>,
        claude: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            selection: Mutex::new(selection),
            cerebras,
            claude,
        }
    }

    pub fn selection(&self) -> ProviderSelection {
        *self
            .selection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn backend(&self, provider: Provider) -> &dyn CompletionBackend {
        match provider {
            Provider::Cerebras => self.cerebras.as_ref(),
            Provider::Claude => self.claude.as_ref(),
        }
    }

    fn promote_fallback(&self, tried: ProviderSelection) {
        let mut current = self
            .selection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Another task may have swapped already.
        if *current == tried {
            *current = tried.swapped();
        }
    }
}

#[async_trait]
impl CompletionBackend for LlmRouter {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let tried = self.selection();
        let ProviderSelection { primary, fallback } = tried;

        let primary_error = match self.backend(primary).complete(request).await {
            Ok(text) => return Ok(text),
            Err(e) => e,
        };
        warn!("{} completion failed, trying {}: {}", primary, fallback, primary_error);

        match self.backend(fallback).complete(request).await {
            Ok(text) => {
                debug!("Switching primary completion provider to {}", fallback);
                self.promote_fallback(tried);
                Ok(text)
            }
            Err(fallback_error) => Err(CompletionError::AllProvidersFailed {
                primary,
                primary_error: Box::new(primary_error),
                fallback,
                fallback_error: Box::new(fallback_error),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::backend::MockCompletionBackend;

    fn ok_backend(text: &'static str) -> Arc<dyn CompletionBackend> {
        let mut mock = MockCompletionBackend::new();
        mock.expect_complete()
            .returning(move |_| Ok(text.to_string()));
        Arc::new(mock)
    }

    fn failing_backend() -> Arc<dyn CompletionBackend> {
        let mut mock = MockCompletionBackend::new();
        mock.expect_complete()
            .returning(|_| Err(CompletionError::NotInstalled));
        Arc::new(mock)
    }

    #[test]
    fn default_selection_is_cerebras_then_claude() {
        let selection = ProviderSelection::default();
        assert_eq!(selection.primary, Provider::Cerebras);
        assert_eq!(selection.fallback, Provider::Claude);
    }

    #[test]
    fn claude_selection_sets_fallback_to_cerebras() {
        let selection = ProviderSelection::from_primary(Provider::Claude);
        assert_eq!(selection.primary, Provider::Claude);
        assert_eq!(selection.fallback, Provider::Cerebras);
    }

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("Claude".parse::<Provider>(), Ok(Provider::Claude));
        assert_eq!(" cerebras ".parse::<Provider>(), Ok(Provider::Cerebras));
        assert!("codex".parse::<Provider>().is_err());
    }

    #[tokio::test]
    async fn primary_success_keeps_selection() {
        let router = LlmRouter::new(
            ProviderSelection::default(),
            ok_backend("feat: from cerebras"),
            failing_backend(),
        );

        let text = router.complete(&CompletionRequest::new("p")).await.unwrap();
        assert_eq!(text, "feat: from cerebras");
        assert_eq!(router.selection().primary, Provider::Cerebras);
    }

    #[tokio::test]
    async fn router_swaps_primary_after_fallback_success() {
        let router = LlmRouter::new(
            ProviderSelection::default(),
            failing_backend(),
            ok_backend("fix: from claude"),
        );

        let text = router.complete(&CompletionRequest::new("p")).await.unwrap();
        assert_eq!(text, "fix: from claude");
        assert_eq!(router.selection().primary, Provider::Claude);
        assert_eq!(router.selection().fallback, Provider::Cerebras);
    }

    #[tokio::test]
    async fn sticky_primary_skips_failed_provider() {
        let mut cerebras = MockCompletionBackend::new();
        cerebras
            .expect_complete()
            .times(1)
            .returning(|_| Err(CompletionError::MissingApiKey));
        let router = LlmRouter::new(
            ProviderSelection::default(),
            Arc::new(cerebras),
            ok_backend("docs: note"),
        );

        router.complete(&CompletionRequest::new("one")).await.unwrap();
        router.complete(&CompletionRequest::new("two")).await.unwrap();
    }

    #[tokio::test]
    async fn both_failures_report_each_provider() {
        let router = LlmRouter::new(
            ProviderSelection::default(),
            failing_backend(),
            failing_backend(),
        );

        let err = router
            .complete(&CompletionRequest::new("p"))
            .await
            .unwrap_err();
        match err {
            CompletionError::AllProvidersFailed {
                primary, fallback, ..
            } => {
                assert_eq!(primary, Provider::Cerebras);
                assert_eq!(fallback, Provider::Claude);
            }
            other => panic!("Expected AllProvidersFailed, got {other:?}"),
        }
        assert_eq!(router.selection().primary, Provider::Cerebras);
    }
}
