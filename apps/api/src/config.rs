use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::ProviderSettings;

/// Room for a full batch of resumes plus form fields.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Only `DATABASE_URL` is required; provider keys are optional and a missing key
/// just makes that provider unavailable.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub default_provider: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub groq_api_key: Option<String>,
    pub groq_model: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub llm_timeout_secs: u64,
    /// Body limit for the multipart upload routes.
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = ProviderSettings::default();

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            default_provider: env_or("DEFAULT_PROVIDER", "openai"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_model: env_or("OPENAI_MODEL", &defaults.openai_model),
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_model: env_or("GEMINI_MODEL", &defaults.gemini_model),
            groq_api_key: optional_env("GROQ_API_KEY"),
            groq_model: env_or("GROQ_MODEL", &defaults.groq_model),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            anthropic_model: env_or("ANTHROPIC_MODEL", &defaults.anthropic_model),
            ollama_base_url: env_or("OLLAMA_BASE_URL", &defaults.ollama_base_url),
            ollama_model: env_or("OLLAMA_MODEL", &defaults.ollama_model),
            llm_timeout_secs: std::env::var("LLM_TIMEOUT_SECS")
                .unwrap_or_else(|_| defaults.timeout.as_secs().to_string())
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_BYTES.to_string())
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a whole number of bytes")?,
        })
    }

    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            openai_api_key: self.openai_api_key.clone(),
            openai_model: self.openai_model.clone(),
            groq_api_key: self.groq_api_key.clone(),
            groq_model: self.groq_model.clone(),
            gemini_api_key: self.gemini_api_key.clone(),
            gemini_model: self.gemini_model.clone(),
            anthropic_api_key: self.anthropic_api_key.clone(),
            anthropic_model: self.anthropic_model.clone(),
            ollama_base_url: self.ollama_base_url.clone(),
            ollama_model: self.ollama_model.clone(),
            timeout: Duration::from_secs(self.llm_timeout_secs),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}
