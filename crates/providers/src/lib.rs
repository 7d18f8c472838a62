//! Provider adapters and model routing for InferenceIQ.
//!
//! Every adapter implements the `inferenceiq_core::Provider` trait and
//! returns its wire response boxed as a `ResponseAdapter`. The
//! [`ComplexityRouter`] picks which model a call should use.

pub mod anthropic;
pub mod openai;
pub mod router;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
pub use router::{COMPLEX_KEYWORDS, ComplexityRouter, RouteDecision, RouteReason};

use inferenceiq_config::AppConfig;
use inferenceiq_core::error::ProviderError;
use inferenceiq_core::provider::Provider;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Build the named provider from configuration.
///
/// Known names are `openai` and `anthropic`. Any other name is treated as an
/// OpenAI-compatible endpoint and needs an `api_url`.
pub fn build_from_config(config: &AppConfig, name: &str) -> Result<Arc<dyn Provider>, ProviderError> {
    let provider_config = config.provider(name);
    let api_key = provider_config
        .and_then(|p| p.api_key.clone())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ProviderError::NotConfigured(format!("no API key for provider '{name}'")))?;
    let api_url = provider_config.and_then(|p| p.api_url.clone());

    let provider: Arc<dyn Provider> = match name {
        "anthropic" => {
            let mut p = AnthropicProvider::new(api_key);
            if let Some(url) = api_url {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        "openai" => {
            let mut p = OpenAiProvider::new(api_key);
            if let Some(url) = api_url {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        other => {
            let url = api_url.ok_or_else(|| {
                ProviderError::NotConfigured(format!("provider '{other}' needs an api_url"))
            })?;
            Arc::new(OpenAiProvider::new(api_key).with_base_url(url))
        }
    };

    debug!(provider = name, "Provider built from config");
    Ok(provider)
}

/// HTTP client with a request timeout.
pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to a default HTTP client");
            reqwest::Client::new()
        })
}

/// Map a transport failure to a provider error.
pub(crate) fn send_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

/// Map a non-200 response to a provider error.
pub(crate) fn status_error(status: u16, body: String) -> ProviderError {
    warn!(status, body = %body, "Provider returned error");
    match status {
        401 | 403 => {
            ProviderError::AuthenticationFailed("Invalid API key or insufficient permissions".into())
        }
        404 => ProviderError::ModelNotFound(body),
        _ => ProviderError::ApiError {
            status_code: status,
            message: body,
        },
    }
}
