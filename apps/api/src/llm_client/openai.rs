//! OpenAI-compatible chat completions backend. Groq speaks the same wire format,
//! so both are served by `OpenAiProvider` with different endpoints.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{send_with_retry, ChatTurn, GenerationOptions, Prompt, ProviderError, TextProvider};

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

pub struct OpenAiProvider {
    client: Client,
    endpoint: &'static str,
    api_key: String,
    model: String,
    label: &'static str,
}

impl OpenAiProvider {
    pub fn new(
        client: Client,
        endpoint: &'static str,
        api_key: String,
        model: String,
        label: &'static str,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            model,
            label,
        }
    }
}

fn build_request<'a>(
    model: &'a str,
    turns: &'a [ChatTurn],
    options: GenerationOptions,
) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: turns
            .iter()
            .map(|t| ChatMessage {
                role: t.role.as_str(),
                content: &t.content,
            })
            .collect(),
        temperature: options.temperature,
        max_tokens: options.max_output_tokens,
    }
}

fn first_choice_text(response: ChatResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|t| !t.trim().is_empty())
        .ok_or(ProviderError::EmptyContent)
}

#[async_trait]
impl TextProvider for OpenAiProvider {
    fn name(&self) -> &str {
        self.label
    }

    async fn generate(
        &self,
        prompt: Prompt,
        options: GenerationOptions,
    ) -> Result<String, ProviderError> {
        let turns = prompt.into_turns();
        let request_body = build_request(&self.model, &turns, options);

        let response = send_with_retry(self.label, || {
            self.client
                .post(self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request_body)
        })
        .await?;

        let body: ChatResponse = response.json().await?;

        if let Some(usage) = &body.usage {
            debug!(
                "{} call succeeded: prompt_tokens={}, completion_tokens={}",
                self.label, usage.prompt_tokens, usage.completion_tokens
            );
        }

        first_choice_text(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_keeps_role_order() {
        let turns = vec![ChatTurn::system("rules"), ChatTurn::user("resume text")];
        let request = build_request(
            "gpt-4o-mini",
            &turns,
            GenerationOptions::with_temperature(0.2),
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "resume text");
        assert_eq!(json["max_tokens"], 2000);
        assert!((json["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_first_choice_text() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "hello"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_choice_text(body).unwrap(), "hello");
    }

    #[test]
    fn test_null_content_is_empty() {
        let body: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(matches!(
            first_choice_text(body),
            Err(ProviderError::EmptyContent)
        ));
    }
}
