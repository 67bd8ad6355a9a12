use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("LLM API error: status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM response contained no choices")]
    EmptyResponse,

    #[error("LLM API key not found in config or environment")]
    MissingKey,
}

/// Per-call options for the chat capability.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        ChatOptions {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4096,
            temperature: 0.0,
        }
    }
}

/// The single provider capability this system depends on: text in,
/// text out, or a classifiable failure.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, prompt: &str, options: &ChatOptions) -> Result<String, LlmError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChatModel {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiChatModel {
    pub fn new(base_url: String, api_key: String) -> Self {
        OpenAiChatModel {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn chat(&self, prompt: &str, options: &ChatOptions) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &options.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        debug!(model = %options.model, prompt_bytes = prompt.len(), "sending chat request");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Keep the status code and body in the message so the retry
            // policy can classify the failure from its text.
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = response.json::<ChatResponse>().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)?;
        debug!(response_bytes = content.len(), "received chat response");
        Ok(content)
    }
}

/// Canned model for demos and tests: returns a fixed reply for every
/// prompt.
pub struct StaticChatModel {
    reply: String,
}

impl StaticChatModel {
    pub fn new(reply: impl Into<String>) -> Self {
        StaticChatModel {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl ChatModel for StaticChatModel {
    async fn chat(&self, _prompt: &str, _options: &ChatOptions) -> Result<String, LlmError> {
        Ok(self.reply.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{classify_error, ErrorType};

    #[tokio::test]
    async fn test_static_model_echoes_reply() {
        let model = StaticChatModel::new("canned");
        let reply = model.chat("anything", &ChatOptions::default()).await.unwrap();
        assert_eq!(reply, "canned");
    }

    #[test]
    fn test_status_error_text_is_classifiable() {
        let err = LlmError::Status {
            status: 429,
            body: "too many requests".to_string(),
        };
        assert_eq!(classify_error(&err.to_string()), ErrorType::RateLimit);

        let err = LlmError::Status {
            status: 400,
            body: "bad request: unknown model".to_string(),
        };
        assert_eq!(classify_error(&err.to_string()), ErrorType::ApiError);
    }
}
