//! Provider traits: the abstraction over LLM backends.
//!
//! A [`Provider`] knows how to send a prompt to a model. Whatever response
//! shape its SDK returns, the recorder only ever asks it two questions,
//! captured by [`ResponseAdapter`]: how many tokens went in and out, and what
//! text came back.
//!
//! Implementations: OpenAI chat completions, Anthropic messages, test mocks.

use crate::error::ProviderError;
use crate::message::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-4o", "claude-3-5-sonnet-20241022")
    pub model: String,

    /// The prompt messages
    pub messages: Vec<Message>,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ProviderRequest {
    /// Create a request for `model` with the given messages.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: None,
        }
    }

    /// Cap the number of generated tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// The two things the recorder needs from any provider response.
pub trait ResponseAdapter: Send {
    /// `(tokens_in, tokens_out)` reported by the provider. `(0, 0)` if absent.
    fn extract_usage(&self) -> (u64, u64);

    /// The generated text.
    fn extract_content(&self) -> String;
}

/// A provider response behind the adapter capability.
pub type BoxedResponse = Box<dyn ResponseAdapter>;

/// Token usage information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// A provider-neutral response, handy for tests and simple adapters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated text
    pub content: String,

    /// Token usage statistics
    pub usage: Option<Usage>,
}

impl ProviderResponse {
    pub fn new(content: impl Into<String>, input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            content: content.into(),
            usage: Some(Usage {
                input_tokens,
                output_tokens,
            }),
        }
    }
}

impl ResponseAdapter for ProviderResponse {
    fn extract_usage(&self) -> (u64, u64) {
        self.usage
            .map(|u| (u.input_tokens, u.output_tokens))
            .unwrap_or((0, 0))
    }

    fn extract_content(&self) -> String {
        self.content.clone()
    }
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. The recorder calls `complete()`
/// without knowing which provider is behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> Result<BoxedResponse, ProviderError>;
}
