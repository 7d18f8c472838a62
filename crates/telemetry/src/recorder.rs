//! Interaction recorder: wraps provider calls with cost and latency capture.
//!
//! Every call produces exactly one record, success or failure, in an
//! in-memory buffer. Nothing touches disk until [`InteractionRecorder::flush`].
//!
//! `call` and `flush` take `&mut self`: appending to the buffer and
//! flush-then-clear are not atomic, so sharing one recorder between tasks
//! needs a mutex around it.

use crate::pricing::PricingCatalog;
use crate::round_to;
use crate::store::{LogStore, MalformedLinePolicy};
use inferenceiq_config::AppConfig;
use inferenceiq_core::error::{ProviderError, StoreError};
use inferenceiq_core::message::Message;
use inferenceiq_core::provider::{Provider, ProviderRequest};
use inferenceiq_core::record::InteractionRecord;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Caller-supplied context merged into the record of one call.
#[derive(Debug, Clone, Default)]
pub struct CallMetadata {
    fingerprint: Option<String>,
    fields: serde_json::Map<String, serde_json::Value>,
}

impl CallMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the prompt for duplicate detection.
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    /// Attach an arbitrary field such as `user_id` or `tags`.
    ///
    /// Canonical field names are reserved and get dropped at record time.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Wraps a provider and records one [`InteractionRecord`] per call.
pub struct InteractionRecorder {
    agent: String,
    provider: Arc<dyn Provider>,
    pricing: Arc<PricingCatalog>,
    store: LogStore,
    buffer: Vec<InteractionRecord>,
}

impl InteractionRecorder {
    pub fn new(
        agent: impl Into<String>,
        provider: Arc<dyn Provider>,
        pricing: Arc<PricingCatalog>,
    ) -> Self {
        Self {
            agent: agent.into(),
            provider,
            pricing,
            store: LogStore::new(),
            buffer: Vec::new(),
        }
    }

    /// Build a recorder for `config.agent`, priced by `config.pricing`.
    ///
    /// Fails only on an unknown `store.on_malformed` value.
    pub fn from_config(config: &AppConfig, provider: Arc<dyn Provider>) -> Result<Self, String> {
        let policy: MalformedLinePolicy = config.store.on_malformed.parse()?;
        let pricing = Arc::new(PricingCatalog::from_config(&config.pricing));
        Ok(Self::new(config.agent.as_str(), provider, pricing)
            .with_store(LogStore::with_policy(policy)))
    }

    /// Use a specific log store for flushing.
    pub fn with_store(mut self, store: LogStore) -> Self {
        self.store = store;
        self
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Records waiting for the next flush, oldest first.
    pub fn buffered(&self) -> &[InteractionRecord] {
        &self.buffer
    }

    /// Number of records waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Send `messages` to `model` and return the generated text.
    pub async fn call(
        &mut self,
        model: &str,
        messages: Vec<Message>,
        metadata: CallMetadata,
    ) -> Result<String, ProviderError> {
        self.call_request(ProviderRequest::new(model, messages), metadata)
            .await
    }

    /// Send a fully built request and return the generated text.
    ///
    /// On failure the provider's error is recorded and then returned as is.
    pub async fn call_request(
        &mut self,
        request: ProviderRequest,
        metadata: CallMetadata,
    ) -> Result<String, ProviderError> {
        let model = request.model.clone();

        let started = Instant::now();
        let result = self.provider.complete(request).await;
        let latency_ms = round_to(started.elapsed().as_secs_f64() * 1000.0, 2);

        match result {
            Ok(response) => {
                let (tokens_in, tokens_out) = response.extract_usage();
                let content = response.extract_content();

                if !self.pricing.contains(&model) {
                    warn!(model = %model, "No pricing for model, recording zero cost");
                }
                let cost = self.pricing.compute_cost(&model, tokens_in, tokens_out);

                let record = InteractionRecord::success(
                    &self.agent,
                    &model,
                    tokens_in,
                    tokens_out,
                    cost,
                    latency_ms,
                );
                self.push(record, metadata);
                Ok(content)
            }
            Err(e) => {
                warn!(
                    provider = %self.provider.name(),
                    model = %model,
                    latency_ms,
                    error = %e,
                    "Provider call failed"
                );
                let record =
                    InteractionRecord::failure(&self.agent, &model, e.to_string(), latency_ms);
                self.push(record, metadata);
                Err(e)
            }
        }
    }

    fn push(&mut self, record: InteractionRecord, metadata: CallMetadata) {
        let mut record = record.with_fingerprint(metadata.fingerprint);
        let rejected = record.merge_metadata(metadata.fields);
        if !rejected.is_empty() {
            warn!(keys = ?rejected, "Dropping metadata keys that collide with record fields");
        }
        debug!(
            interaction_id = %record.interaction_id,
            model = %record.model,
            outcome = %record.outcome,
            cost = record.cost.unwrap_or(0.0),
            latency_ms = record.latency_ms.unwrap_or(0.0),
            "Recorded interaction"
        );
        self.buffer.push(record);
    }

    /// Append every buffered record to `path` and clear the buffer.
    ///
    /// Returns the number of records written. With an empty buffer this
    /// returns 0 without touching the filesystem. If the write fails the
    /// buffer is left as it was.
    pub fn flush(&mut self, path: &Path) -> Result<usize, StoreError> {
        if self.buffer.is_empty() {
            return Ok(0);
        }
        let written = self.store.append(path, &self.buffer)?;
        self.buffer.clear();
        info!(path = %path.display(), count = written, "Flushed interaction records");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use inferenceiq_core::provider::{BoxedResponse, ProviderResponse};
    use inferenceiq_core::record::Outcome;
    use serde_json::json;

    struct StaticProvider {
        content: &'static str,
        usage: (u64, u64),
    }

    #[async_trait]
    impl Provider for StaticProvider {
        fn name(&self) -> &str {
            "static"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<BoxedResponse, ProviderError> {
            Ok(Box::new(ProviderResponse::new(
                self.content,
                self.usage.0,
                self.usage.1,
            )))
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl Provider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<BoxedResponse, ProviderError> {
            Err(ProviderError::ApiError {
                status_code: 529,
                message: "Anthropic API Error".into(),
            })
        }
    }

    fn recorder(provider: impl Provider + 'static) -> InteractionRecorder {
        InteractionRecorder::new(
            "anthropic_agent",
            Arc::new(provider),
            Arc::new(PricingCatalog::with_defaults()),
        )
    }

    #[tokio::test]
    async fn successful_call_is_priced_and_buffered() {
        let mut rec = recorder(StaticProvider {
            content: "Claude response",
            usage: (15, 25),
        });

        let content = rec
            .call(
                "claude-3-5-sonnet-20241022",
                vec![Message::user("Hello Claude")],
                CallMetadata::new(),
            )
            .await
            .unwrap();

        assert_eq!(content, "Claude response");
        assert_eq!(rec.pending(), 1);
        let record = &rec.buffered()[0];
        assert_eq!(record.agent, "anthropic_agent");
        assert_eq!(record.model, "claude-3-5-sonnet-20241022");
        assert_eq!(record.tokens_in, Some(15));
        assert_eq!(record.tokens_out, Some(25));
        assert_eq!(record.tokens_total, Some(40));
        assert_eq!(record.outcome, Outcome::Success);
        assert!(record.latency_ms.unwrap() >= 0.0);
        assert!(record.timestamp.is_some());
        // 15 * 0.0024900 + 25 * 0.0124500 = 0.03735 + 0.31125
        assert!((record.cost.unwrap() - 0.3486).abs() < 1e-10);
    }

    #[tokio::test]
    async fn from_config_uses_agent_and_pricing() {
        let mut config = AppConfig::default();
        config.agent = "billing_bot".into();
        config.pricing.models.insert(
            "house-model".into(),
            inferenceiq_config::RateConfig {
                input_rate: 0.5,
                output_rate: 1.0,
            },
        );
        config.store.on_malformed = "skip_line".into();

        let provider = Arc::new(StaticProvider {
            content: "ok",
            usage: (10, 4),
        });
        let mut rec = InteractionRecorder::from_config(&config, provider).unwrap();
        assert_eq!(rec.agent(), "billing_bot");

        rec.call("house-model", vec![Message::user("hi")], CallMetadata::new())
            .await
            .unwrap();
        let record = &rec.buffered()[0];
        assert_eq!(record.agent, "billing_bot");
        assert_eq!(record.cost, Some(9.0));
    }

    #[test]
    fn from_config_rejects_unknown_policy() {
        let mut config = AppConfig::default();
        config.store.on_malformed = "ignore".into();
        assert!(InteractionRecorder::from_config(&config, Arc::new(FailingProvider)).is_err());
    }

    #[tokio::test]
    async fn failed_call_is_recorded_and_error_returned_unchanged() {
        let mut rec = recorder(FailingProvider);

        let err = rec
            .call(
                "claude-3-5-sonnet-20241022",
                vec![Message::user("Hi")],
                CallMetadata::new().with("session_id", "s-1"),
            )
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProviderError::ApiError {
                status_code: 529,
                message: "Anthropic API Error".into(),
            }
        );
        assert_eq!(rec.pending(), 1);
        let record = &rec.buffered()[0];
        assert_eq!(record.outcome, Outcome::Failed);
        assert_eq!(record.error.as_deref(), Some(err.to_string().as_str()));
        assert!(record.cost.is_none());
        assert!(record.tokens_in.is_none());
        assert!(record.latency_ms.is_some());
        assert_eq!(record.metadata["session_id"], "s-1");
    }

    #[tokio::test]
    async fn unknown_model_costs_nothing() {
        let mut rec = recorder(StaticProvider {
            content: "ok",
            usage: (1000, 500),
        });
        rec.call("foo", vec![Message::user("hi")], CallMetadata::new())
            .await
            .unwrap();
        assert_eq!(rec.buffered()[0].cost, Some(0.0));
    }

    #[tokio::test]
    async fn metadata_is_merged_without_overriding_fields() {
        let mut rec = recorder(StaticProvider {
            content: "ok",
            usage: (10, 10),
        });
        let metadata = CallMetadata::new()
            .with_fingerprint("hash_123")
            .with("user_id", "u-42")
            .with("tags", json!(["billing", "beta"]))
            .with("model", "spoofed");

        rec.call("gpt-4o", vec![Message::user("hi")], metadata)
            .await
            .unwrap();

        let record = &rec.buffered()[0];
        assert_eq!(record.model, "gpt-4o");
        assert_eq!(record.fingerprint.as_deref(), Some("hash_123"));
        assert_eq!(record.metadata["user_id"], "u-42");
        assert_eq!(record.metadata["tags"], json!(["billing", "beta"]));
        assert!(!record.metadata.contains_key("model"));
    }

    #[tokio::test]
    async fn flush_writes_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phase2").join("anthropic_logs.jsonl");
        let mut rec = recorder(StaticProvider {
            content: "Phase 2 Verified",
            usage: (100, 50),
        });

        rec.call(
            "claude-3-5-sonnet-20241022",
            vec![Message::user("Verify me")],
            CallMetadata::new(),
        )
        .await
        .unwrap();
        let _ = rec
            .call("gpt-4o", vec![Message::user("again")], CallMetadata::new())
            .await;

        assert_eq!(rec.flush(&path).unwrap(), 2);
        assert_eq!(rec.pending(), 0);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["agent"], "anthropic_agent");
        assert_eq!(first["tokens_in"], 100);
        assert_eq!(first["outcome"], "success");
        // 100 * 0.0024900 + 50 * 0.0124500 = 0.249 + 0.6225
        assert!((first["cost"].as_f64().unwrap() - 0.8715).abs() < 1e-10);

        // Second flush has nothing to do
        assert_eq!(rec.flush(&path).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn flush_with_empty_buffer_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never").join("empty_logs.jsonl");
        let mut rec = recorder(FailingProvider);
        assert_eq!(rec.flush(&path).unwrap(), 0);
        assert!(!path.exists());
        assert!(!dir.path().join("never").exists());
    }

    #[tokio::test]
    async fn failed_flush_keeps_buffer() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the log file should be makes the open fail.
        let path = dir.path().join("costs.jsonl");
        std::fs::create_dir_all(&path).unwrap();

        let mut rec = recorder(StaticProvider {
            content: "ok",
            usage: (1, 1),
        });
        rec.call("gpt-4o", vec![Message::user("hi")], CallMetadata::new())
            .await
            .unwrap();

        assert!(rec.flush(&path).is_err());
        assert_eq!(rec.pending(), 1);
    }
}
