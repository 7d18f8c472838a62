//! OpenAI chat-completions provider.
//!
//! Also works with any endpoint that speaks the same `/chat/completions`
//! wire format (set `api_url` in the provider config).

use crate::{http_client, send_error, status_error};
use async_trait::async_trait;
use inferenceiq_core::error::ProviderError;
use inferenceiq_core::message::Message;
use inferenceiq_core::provider::{BoxedResponse, Provider, ProviderRequest, ResponseAdapter};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// An OpenAI-compatible chat completions provider.
pub struct OpenAiProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            name: "openai".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client: http_client(120),
        }
    }

    /// Point at a proxy or another OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<BoxedResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "stream": false,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(status_error(status, error_body));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(Box::new(completion))
    }
}

// --- OpenAI API types ---

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

/// A `/chat/completions` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ChatUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

impl ResponseAdapter for ChatCompletion {
    fn extract_usage(&self) -> (u64, u64) {
        self.usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0))
    }

    fn extract_content(&self) -> String {
        self.choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inferenceiq_core::message::Role;

    fn parse(body: serde_json::Value) -> ChatCompletion {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn constructor() {
        let provider = OpenAiProvider::new("sk-test");
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn constructor_with_base_url() {
        let provider = OpenAiProvider::new("sk-test").with_base_url("http://localhost:8080/v1/");
        assert_eq!(provider.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn message_conversion() {
        let messages = vec![Message::system("Be brief"), Message::user("Hi")];
        let api = OpenAiProvider::to_api_messages(&messages);
        assert_eq!(api.len(), 2);
        assert_eq!(api[0].role, "system");
        assert_eq!(api[1].role, Role::User.to_string());
        assert_eq!(api[1].content, "Hi");
    }

    #[test]
    fn adapter_reads_usage_and_content() {
        let completion = parse(serde_json::json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello!"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }));
        assert_eq!(completion.extract_usage(), (12, 3));
        assert_eq!(completion.extract_content(), "Hello!");
    }

    #[test]
    fn adapter_defaults_when_fields_missing() {
        let completion = parse(serde_json::json!({"model": "gpt-4o", "choices": []}));
        assert_eq!(completion.extract_usage(), (0, 0));
        assert_eq!(completion.extract_content(), "");

        let null_content = parse(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        }));
        assert_eq!(null_content.extract_content(), "");
    }
}
