// Resume matching: structured extraction, scoring and batch ranking.
// Model calls go through `llm_client::TextProvider` only. Every model-backed step
// has a deterministic tier behind it, so a batch always completes.

pub mod batch;
pub mod extractor;
pub mod fallback;
pub mod handlers;
pub mod profiles;
pub mod prompts;
pub mod scorer;

use thiserror::Error;

use crate::llm_client::json::MalformedOutput;
use crate::llm_client::ProviderError;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    MalformedOutput(#[from] MalformedOutput),

    #[error("{0}")]
    InputValidation(String),

    /// Every tier of a strategy chain failed. Only reachable with a chain that
    /// has no deterministic tier.
    #[error("All {0} strategies failed")]
    Exhausted(&'static str),
}
