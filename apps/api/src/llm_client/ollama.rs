//! Local Ollama `/api/chat` backend. No credentials; availability is only known
//! once a call is made.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{send_with_retry, GenerationOptions, Prompt, ProviderError, TextProvider};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ModelOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ModelOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(client: Client, base_url: String, model: String) -> Self {
        Self {
            client,
            base_url,
            model,
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(
        &self,
        prompt: Prompt,
        options: GenerationOptions,
    ) -> Result<String, ProviderError> {
        let turns = prompt.into_turns();
        let request_body = ChatRequest {
            model: &self.model,
            messages: turns
                .iter()
                .map(|t| ChatMessage {
                    role: t.role.as_str(),
                    content: &t.content,
                })
                .collect(),
            stream: false,
            options: ModelOptions {
                temperature: options.temperature,
                num_predict: options.max_output_tokens,
            },
        };
        let url = self.chat_url();

        let response =
            send_with_retry("ollama", || self.client.post(&url).json(&request_body)).await?;
        let body: ChatResponse = response.json().await?;

        body.message
            .map(|m| m.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ProviderError::EmptyContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_url_tolerates_trailing_slash() {
        let provider = OllamaProvider::new(
            Client::new(),
            "http://localhost:11434/".to_string(),
            "llama3.1".to_string(),
        );
        assert_eq!(provider.chat_url(), "http://localhost:11434/api/chat");
    }

    #[test]
    fn test_response_message_content() {
        let body: ChatResponse =
            serde_json::from_str(r#"{"message": {"role": "assistant", "content": "ok"}, "done": true}"#)
                .unwrap();
        assert_eq!(body.message.unwrap().content, "ok");
    }
}
