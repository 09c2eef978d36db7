//! Structured extraction: free text → `ResumeProfile` / `JobProfile`.
//!
//! Extraction is an ordered chain of `ProfileExtractor` tiers. The standard chain is
//! model first (when a provider is present), patterns last. The pattern tier cannot
//! fail, so `ExtractionChain::standard` always produces a fully populated profile.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::llm_client::json::parse_json_object;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{GenerationOptions, Prompt, TextProvider};
use crate::matching::fallback;
use crate::matching::profiles::{JobProfile, ResumeProfile};
use crate::matching::prompts::{JOB_EXTRACTION_PROMPT, RESUME_EXTRACTION_PROMPT};
use crate::matching::MatchError;

/// Low temperature keeps extraction close to the source text.
const EXTRACTION_TEMPERATURE: f32 = 0.2;

#[async_trait]
pub trait ProfileExtractor: Send + Sync {
    /// Tier name, used in logs.
    fn label(&self) -> &'static str;

    async fn resume(&self, text: &str) -> Result<ResumeProfile, MatchError>;

    async fn job(&self, text: &str) -> Result<JobProfile, MatchError>;
}

// ────────────────────────────────────────────────────────────────────────────
// ModelExtractor
// ────────────────────────────────────────────────────────────────────────────

pub struct ModelExtractor {
    provider: Arc<dyn TextProvider>,
}

impl ModelExtractor {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self { provider }
    }

    async fn call(&self, prompt: String) -> Result<Map<String, Value>, MatchError> {
        let raw = self
            .provider
            .generate(
                Prompt::with_system(JSON_ONLY_SYSTEM, prompt),
                GenerationOptions::with_temperature(EXTRACTION_TEMPERATURE),
            )
            .await?;
        Ok(parse_json_object(&raw)?)
    }
}

#[async_trait]
impl ProfileExtractor for ModelExtractor {
    fn label(&self) -> &'static str {
        "model"
    }

    async fn resume(&self, text: &str) -> Result<ResumeProfile, MatchError> {
        let root = self
            .call(RESUME_EXTRACTION_PROMPT.replace("{resume_text}", text))
            .await?;
        Ok(ResumeProfile::from_model_json(&root))
    }

    async fn job(&self, text: &str) -> Result<JobProfile, MatchError> {
        let root = self
            .call(JOB_EXTRACTION_PROMPT.replace("{job_description}", text))
            .await?;
        Ok(JobProfile::from_model_json(&root))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PatternExtractor
// ────────────────────────────────────────────────────────────────────────────

/// Regex-based extraction. Never fails.
pub struct PatternExtractor;

#[async_trait]
impl ProfileExtractor for PatternExtractor {
    fn label(&self) -> &'static str {
        "pattern"
    }

    async fn resume(&self, text: &str) -> Result<ResumeProfile, MatchError> {
        Ok(fallback::extract_resume(text))
    }

    async fn job(&self, text: &str) -> Result<JobProfile, MatchError> {
        Ok(fallback::extract_job(text))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Chain
// ────────────────────────────────────────────────────────────────────────────

pub struct ExtractionChain {
    tiers: Vec<Arc<dyn ProfileExtractor>>,
}

impl ExtractionChain {
    pub fn new(tiers: Vec<Arc<dyn ProfileExtractor>>) -> Self {
        Self { tiers }
    }

    /// Model tier when a provider is given, then the pattern tier.
    pub fn standard(provider: Option<Arc<dyn TextProvider>>) -> Self {
        let mut tiers: Vec<Arc<dyn ProfileExtractor>> = Vec::with_capacity(2);
        if let Some(provider) = provider {
            tiers.push(Arc::new(ModelExtractor::new(provider)));
        }
        tiers.push(Arc::new(PatternExtractor));
        Self { tiers }
    }

    pub async fn extract_resume(&self, text: &str) -> Result<ResumeProfile, MatchError> {
        for tier in &self.tiers {
            match tier.resume(text).await {
                Ok(profile) => {
                    debug!("Resume extracted by {} tier", tier.label());
                    return Ok(profile);
                }
                Err(e) => warn!("Resume extraction via {} failed, falling back: {e}", tier.label()),
            }
        }
        Err(MatchError::Exhausted("resume extraction"))
    }

    pub async fn extract_job(&self, text: &str) -> Result<JobProfile, MatchError> {
        for tier in &self.tiers {
            match tier.job(text).await {
                Ok(profile) => {
                    debug!("Job description extracted by {} tier", tier.label());
                    return Ok(profile);
                }
                Err(e) => warn!(
                    "Job description extraction via {} failed, falling back: {e}",
                    tier.label()
                ),
            }
        }
        Err(MatchError::Exhausted("job extraction"))
    }
}

/// Extracts a resume profile with the standard chain. Never fails.
pub async fn extract_resume(text: &str, provider: Option<Arc<dyn TextProvider>>) -> ResumeProfile {
    ExtractionChain::standard(provider)
        .extract_resume(text)
        .await
        .unwrap_or_else(|_| fallback::extract_resume(text))
}

/// Extracts a job profile with the standard chain. Never fails.
pub async fn extract_job(text: &str, provider: Option<Arc<dyn TextProvider>>) -> JobProfile {
    ExtractionChain::standard(provider)
        .extract_job(text)
        .await
        .unwrap_or_else(|_| fallback::extract_job(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedProvider;
    use crate::llm_client::ProviderError;
    use crate::matching::profiles::NOT_SPECIFIED;

    const RESUME: &str = "John Smith\njohn@example.com\nSKILLS: Rust, Python, Docker\n";

    #[tokio::test]
    async fn test_model_tier_parses_fenced_json() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(
            "```json\n{\"personal_info\": {\"name\": \"John Smith\"}, \
             \"skills\": {\"technical_skills\": [\"Rust\"]}}\n```"
                .to_string(),
        )]));

        let profile = extract_resume(RESUME, Some(provider)).await;
        assert_eq!(profile.name, "John Smith");
        assert_eq!(profile.technical_skills, vec!["Rust"]);
        assert_eq!(profile.email, NOT_SPECIFIED);
    }

    #[tokio::test]
    async fn test_garbage_output_falls_back_to_patterns() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(
            "Sorry, I cannot help with that.".to_string(),
        )]));

        let profile = extract_resume(RESUME, Some(provider)).await;
        assert_eq!(profile.email, "john@example.com");
        assert_eq!(profile.technical_skills, vec!["Rust", "Python", "Docker"]);
        assert_eq!(profile.name, NOT_SPECIFIED);
    }

    #[tokio::test]
    async fn test_provider_error_falls_back_to_patterns() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::Timeout(
            std::time::Duration::from_secs(60),
        ))]));

        let profile = extract_resume(RESUME, Some(provider)).await;
        assert_eq!(profile.email, "john@example.com");
    }

    #[tokio::test]
    async fn test_no_provider_uses_patterns() {
        let job = extract_job("Required skills: Go, Rust, Kafka", None).await;
        assert_eq!(job.required_skills, vec!["Rust", "Kafka"]);
    }

    #[tokio::test]
    async fn test_empty_text_yields_defaults() {
        assert_eq!(extract_resume("", None).await, ResumeProfile::default());
        assert_eq!(extract_job("", None).await, JobProfile::default());
    }

    #[tokio::test]
    async fn test_model_tier_uses_low_temperature_and_json_system_turn() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok("{}".to_string())]));
        let _ = extract_job("Backend Engineer", Some(provider.clone())).await;

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        let (prompt, options) = &calls[0];
        assert!((options.temperature - EXTRACTION_TEMPERATURE).abs() < f32::EPSILON);
        match prompt {
            Prompt::Turns(turns) => {
                assert_eq!(turns[0].content, JSON_ONLY_SYSTEM);
                assert!(turns[1].content.contains("Backend Engineer"));
            }
            Prompt::Text(_) => panic!("expected role-tagged turns"),
        }
    }

    #[tokio::test]
    async fn test_chain_without_pattern_tier_can_exhaust() {
        let model: Arc<dyn ProfileExtractor> =
            Arc::new(ModelExtractor::new(Arc::new(ScriptedProvider::failing())));
        let chain = ExtractionChain::new(vec![model]);
        let result = chain.extract_resume(RESUME).await;
        assert!(matches!(result, Err(MatchError::Exhausted(_))));
    }
}
