/// LLM Client: the capability interface every text-generation backend implements.
///
/// ARCHITECTURAL RULE: matching, email and job-description code only ever see
/// `dyn TextProvider`. Backends are chosen by identifier through `create_provider`
/// (or the `ProviderRegistry` held in `AppState`) and never constructed directly.
///
/// Every provider handed out by the factory is wrapped in `TimedProvider`, so a slow
/// backend surfaces as `ProviderError::Timeout` instead of stalling a batch.
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod anthropic;
pub mod gemini;
pub mod json;
pub mod ollama;
pub mod openai;
pub mod prompts;
#[cfg(test)]
pub mod testing;

use self::anthropic::AnthropicProvider;
use self::gemini::GeminiProvider;
use self::ollama::OllamaProvider;
use self::openai::{OpenAiProvider, GROQ_API_URL, OPENAI_API_URL};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2000;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Provider call failed: {0}")]
    Call(String),

    #[error("Provider call timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Provider returned empty content")]
    EmptyContent,
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Call(e.to_string())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Prompt model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One role-tagged turn of a conversation prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A prompt is either a bare instruction or an ordered list of role-tagged turns.
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    Text(String),
    Turns(Vec<ChatTurn>),
}

impl Prompt {
    pub fn with_system(system: &str, user: impl Into<String>) -> Self {
        Prompt::Turns(vec![ChatTurn::system(system), ChatTurn::user(user)])
    }

    /// Normalizes to turns; a bare instruction becomes a single user turn.
    pub fn into_turns(self) -> Vec<ChatTurn> {
        match self {
            Prompt::Text(text) => vec![ChatTurn::user(text)],
            Prompt::Turns(turns) => turns,
        }
    }

    /// Renders the prompt as one string for backends without role support.
    pub fn flatten(&self) -> String {
        match self {
            Prompt::Text(text) => text.clone(),
            Prompt::Turns(turns) => turns
                .iter()
                .map(|t| format!("{}: {}", t.role.as_str().to_uppercase(), t.content))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl From<String> for Prompt {
    fn from(text: String) -> Self {
        Prompt::Text(text)
    }
}

impl From<&str> for Prompt {
    fn from(text: &str) -> Self {
        Prompt::Text(text.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

impl GenerationOptions {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature,
            ..Self::default()
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Capability trait
// ────────────────────────────────────────────────────────────────────────────

/// Send a prompt, get raw text back. No schema enforcement happens at this layer.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Backend identifier, used in logs.
    fn name(&self) -> &str;

    async fn generate(
        &self,
        prompt: Prompt,
        options: GenerationOptions,
    ) -> Result<String, ProviderError>;
}

/// Applies a wall-clock limit to every call of the wrapped provider.
pub struct TimedProvider {
    inner: Arc<dyn TextProvider>,
    limit: Duration,
}

impl TimedProvider {
    pub fn new(inner: Arc<dyn TextProvider>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl TextProvider for TimedProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(
        &self,
        prompt: Prompt,
        options: GenerationOptions,
    ) -> Result<String, ProviderError> {
        match tokio::time::timeout(self.limit, self.inner.generate(prompt, options)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} call exceeded {}s", self.inner.name(), self.limit.as_secs());
                Err(ProviderError::Timeout(self.limit))
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Factory
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Groq,
    Gemini,
    Ollama,
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Groq => "groq",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Anthropic => "anthropic",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "groq" => Ok(ProviderKind::Groq),
            "gemini" => Ok(ProviderKind::Gemini),
            "ollama" => Ok(ProviderKind::Ollama),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            other => Err(ProviderError::Unavailable(format!(
                "Unknown provider: {other}"
            ))),
        }
    }
}

/// Credentials, models and limits for every backend, loaded once from config.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub groq_api_key: Option<String>,
    pub groq_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub timeout: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            groq_api_key: None,
            groq_model: "llama-3.1-8b-instant".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-2.5-flash-lite".to_string(),
            anthropic_api_key: None,
            anthropic_model: "claude-sonnet-4-5".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.1".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Builds a timed provider for `name`.
///
/// `api_key_override` (a per-request key) wins over the configured key. A missing key
/// is `Unavailable`, which callers treat as "use the deterministic path".
pub fn create_provider(
    name: &str,
    settings: &ProviderSettings,
    http: &Client,
    api_key_override: Option<&str>,
) -> Result<Arc<dyn TextProvider>, ProviderError> {
    let kind: ProviderKind = name.parse()?;

    let key = |configured: &Option<String>| -> Result<String, ProviderError> {
        api_key_override
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .or_else(|| configured.clone().filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| {
                ProviderError::Unavailable(format!("{} API key not provided", kind.as_str()))
            })
    };

    let inner: Arc<dyn TextProvider> = match kind {
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(
            http.clone(),
            OPENAI_API_URL,
            key(&settings.openai_api_key)?,
            settings.openai_model.clone(),
            "openai",
        )),
        ProviderKind::Groq => Arc::new(OpenAiProvider::new(
            http.clone(),
            GROQ_API_URL,
            key(&settings.groq_api_key)?,
            settings.groq_model.clone(),
            "groq",
        )),
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(
            http.clone(),
            key(&settings.gemini_api_key)?,
            settings.gemini_model.clone(),
        )),
        ProviderKind::Ollama => Arc::new(OllamaProvider::new(
            http.clone(),
            settings.ollama_base_url.clone(),
            settings.ollama_model.clone(),
        )),
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(
            http.clone(),
            key(&settings.anthropic_api_key)?,
            settings.anthropic_model.clone(),
        )),
    };

    debug!("Created {} provider", kind.as_str());
    Ok(Arc::new(TimedProvider::new(inner, settings.timeout)))
}

/// Process-wide provider lookup. Holds one pooled HTTP client shared by all backends.
#[derive(Clone)]
pub struct ProviderRegistry {
    settings: ProviderSettings,
    default_provider: String,
    http: Client,
}

impl ProviderRegistry {
    pub fn new(settings: ProviderSettings, default_provider: String) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            settings,
            default_provider,
            http,
        })
    }

    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    pub fn resolve(
        &self,
        name: Option<&str>,
        api_key_override: Option<&str>,
    ) -> Result<Arc<dyn TextProvider>, ProviderError> {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.default_provider);
        create_provider(name, &self.settings, &self.http, api_key_override)
    }
}

/// Sends a request, retrying 429 and 5xx with exponential backoff (1s, 2s).
/// Other non-success statuses fail immediately.
pub(crate) async fn send_with_retry<F>(provider: &str, build: F) -> Result<Response, ProviderError>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_error: Option<ProviderError> = None;

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
            warn!(
                "{provider} call attempt {} failed, retrying after {}ms...",
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        let response = match build().send().await {
            Ok(r) => r,
            Err(e) => {
                last_error = Some(ProviderError::Call(e.to_string()));
                continue;
            }
        };

        let status = response.status();

        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("{provider} API returned {status}: {}", json::excerpt(&body, 300));
            last_error = Some(ProviderError::Call(format!(
                "{provider} API returned {status}"
            )));
            continue;
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Call(format!(
                "{provider} API returned {status}: {}",
                json::excerpt(&body, 300)
            )));
        }

        return Ok(response);
    }

    Err(last_error.unwrap_or_else(|| {
        ProviderError::Call(format!("{provider} failed after {MAX_RETRIES} attempts"))
    }))
}
