use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::llm_client::{ProviderRegistry, TextProvider};
use crate::store::MatchStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Builds a provider per request so a caller-supplied API key can override config.
    pub providers: ProviderRegistry,
    pub store: MatchStore,
}

/// Query parameters accepted by every endpoint that may call a model.
#[derive(Debug, Default, Deserialize)]
pub struct ProviderParams {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub use_ai: Option<bool>,
}

impl AppState {
    /// Resolves the requested provider. `use_ai=false` or a provider that cannot be
    /// built yields `None`, which every caller treats as "deterministic path only".
    pub fn provider_for(&self, params: &ProviderParams) -> Option<Arc<dyn TextProvider>> {
        if !params.use_ai.unwrap_or(true) {
            return None;
        }
        match self
            .providers
            .resolve(params.provider.as_deref(), params.api_key.as_deref())
        {
            Ok(provider) => Some(provider),
            Err(e) => {
                warn!("Failed to initialize AI provider, using basic processing: {e}");
                None
            }
        }
    }
}
