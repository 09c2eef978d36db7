//! Anthropic Messages API backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{send_with_retry, GenerationOptions, Prompt, ProviderError, Role, TextProvider};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicResponse {
    /// Text of the first text block.
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(client: Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }
}

/// System turns are lifted into the top-level `system` field; the API rejects them
/// inside `messages`.
fn build_request<'a>(
    model: &'a str,
    turns: &'a [super::ChatTurn],
    options: GenerationOptions,
) -> AnthropicRequest<'a> {
    let system: Vec<&str> = turns
        .iter()
        .filter(|t| t.role == Role::System)
        .map(|t| t.content.as_str())
        .collect();

    AnthropicRequest {
        model,
        max_tokens: options.max_output_tokens,
        temperature: options.temperature,
        system: (!system.is_empty()).then(|| system.join("\n\n")),
        messages: turns
            .iter()
            .filter(|t| t.role != Role::System)
            .map(|t| AnthropicMessage {
                role: t.role.as_str(),
                content: &t.content,
            })
            .collect(),
    }
}

#[async_trait]
impl TextProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(
        &self,
        prompt: Prompt,
        options: GenerationOptions,
    ) -> Result<String, ProviderError> {
        let turns = prompt.into_turns();
        let request_body = build_request(&self.model, &turns, options);

        let response = send_with_retry("anthropic", || {
            self.client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
        })
        .await?;

        let body: AnthropicResponse = response.json().await?;

        if let Some(usage) = &body.usage {
            debug!(
                "anthropic call succeeded: input_tokens={}, output_tokens={}",
                usage.input_tokens, usage.output_tokens
            );
        }

        body.text()
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .ok_or(ProviderError::EmptyContent)
    }
}
