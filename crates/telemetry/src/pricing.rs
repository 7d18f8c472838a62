//! Pricing catalog for common LLM models.
//!
//! Rates are in currency per token (INR by default). Each model has an input
//! and an output rate. The catalog is injected into the recorder and the
//! metrics engine, so a price change never touches costing logic.

use inferenceiq_config::PricingConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-token pricing for a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelRate {
    /// Price per input token.
    pub input_rate: f64,
    /// Price per output token.
    pub output_rate: f64,
}

impl ModelRate {
    /// Create a new pricing entry.
    pub fn new(input_rate: f64, output_rate: f64) -> Self {
        Self {
            input_rate,
            output_rate,
        }
    }

    /// Compute cost for the given token counts.
    pub fn cost(&self, tokens_in: u64, tokens_out: u64) -> f64 {
        tokens_in as f64 * self.input_rate + tokens_out as f64 * self.output_rate
    }
}

/// Model identifier → per-token rates.
#[derive(Debug, Clone)]
pub struct PricingCatalog {
    currency: String,
    rates: HashMap<String, ModelRate>,
}

impl PricingCatalog {
    /// Create a catalog with built-in model prices (USD list price × 83, in INR).
    pub fn with_defaults() -> Self {
        let mut rates = HashMap::new();

        // ── OpenAI ─────────────────────────────────────────────────
        rates.insert("gpt-4o".into(), ModelRate::new(0.0020750, 0.0083000));
        rates.insert("gpt-4o-mini".into(), ModelRate::new(0.0001245, 0.0004980));
        rates.insert("gpt-4-turbo".into(), ModelRate::new(0.0083000, 0.0249000));
        rates.insert("o1".into(), ModelRate::new(0.0124500, 0.0498000));

        // ── Anthropic ──────────────────────────────────────────────
        rates.insert(
            "claude-3-5-sonnet-20241022".into(),
            ModelRate::new(0.0024900, 0.0124500),
        );
        rates.insert(
            "claude-3-opus-20240229".into(),
            ModelRate::new(0.0124500, 0.0622500),
        );
        rates.insert(
            "claude-3-haiku-20240307".into(),
            ModelRate::new(0.0002075, 0.0010375),
        );

        // ── AWS Bedrock ────────────────────────────────────────────
        rates.insert(
            "anthropic.claude-3-5-sonnet-20241022-v2:0".into(),
            ModelRate::new(0.0024900, 0.0124500),
        );
        rates.insert(
            "anthropic.claude-3-haiku-20240307-v1:0".into(),
            ModelRate::new(0.0002075, 0.0010375),
        );

        Self {
            currency: "INR".into(),
            rates,
        }
    }

    /// Create an empty catalog.
    pub fn empty(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            rates: HashMap::new(),
        }
    }

    /// Build a catalog from configuration: optional defaults plus overrides.
    pub fn from_config(config: &PricingConfig) -> Self {
        let mut catalog = if config.include_defaults {
            Self::with_defaults()
        } else {
            Self::empty(config.currency.as_str())
        };
        catalog.currency = config.currency.clone();
        for (model, rate) in &config.models {
            catalog.set(model.as_str(), ModelRate::new(rate.input_rate, rate.output_rate));
        }
        catalog
    }

    /// Look up pricing for a model. Returns None if not found.
    pub fn get(&self, model: &str) -> Option<ModelRate> {
        self.rates.get(model).copied()
    }

    /// Add or update pricing for a model.
    pub fn set(&mut self, model: impl Into<String>, rate: ModelRate) {
        self.rates.insert(model.into(), rate);
    }

    /// `(input_rate, output_rate)` for a model; `(0, 0)` when unknown.
    pub fn rate_for(&self, model: &str) -> (f64, f64) {
        self.get(model)
            .map(|r| (r.input_rate, r.output_rate))
            .unwrap_or((0.0, 0.0))
    }

    /// Compute cost for a model call, returning 0.0 if the model is not in
    /// the catalog. Matching is exact: a dated or prefixed variant of a known
    /// model is a different model.
    pub fn compute_cost(&self, model: &str, tokens_in: u64, tokens_out: u64) -> f64 {
        self.get(model)
            .map(|rate| rate.cost(tokens_in, tokens_out))
            .unwrap_or(0.0)
    }

    /// Whether the catalog has rates for `model`.
    pub fn contains(&self, model: &str) -> bool {
        self.rates.contains_key(model)
    }

    /// Currency label for every rate.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// List all known model names.
    pub fn models(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rates.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of models in the catalog.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PricingCatalog {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inferenceiq_config::RateConfig;

    #[test]
    fn default_catalog_has_models() {
        let catalog = PricingCatalog::with_defaults();
        assert_eq!(catalog.len(), 9);
        assert_eq!(catalog.currency(), "INR");
    }

    #[test]
    fn known_model_cost() {
        let catalog = PricingCatalog::with_defaults();

        // gpt-4o: 1000 * 0.0020750 + 500 * 0.0083000 = 2.075 + 4.15
        let cost = catalog.compute_cost("gpt-4o", 1000, 500);
        assert!((cost - 6.225).abs() < 1e-10);

        // claude-3-5-sonnet: 1000 * 0.0024900 + 500 * 0.0124500 = 2.49 + 6.225
        let cost = catalog.compute_cost("claude-3-5-sonnet-20241022", 1000, 500);
        assert!((cost - 8.715).abs() < 1e-10);
    }

    #[test]
    fn catalog_cost_matches_rate_cost() {
        let mut catalog = PricingCatalog::empty("INR");
        let rate = ModelRate::new(0.5, 2.0);
        catalog.set("m", rate);
        assert_eq!(catalog.compute_cost("m", 10, 3), rate.cost(10, 3));
        assert_eq!(rate.cost(10, 3), 11.0);
    }

    #[test]
    fn unknown_model_returns_zero() {
        let catalog = PricingCatalog::with_defaults();
        assert_eq!(catalog.rate_for("foo"), (0.0, 0.0));
        assert_eq!(catalog.compute_cost("foo", 1000, 500), 0.0);
    }

    #[test]
    fn matching_is_exact() {
        let catalog = PricingCatalog::with_defaults();
        assert_eq!(catalog.compute_cost("gpt-4o-2024-08-06", 1000, 0), 0.0);
        assert_eq!(catalog.compute_cost("openai/gpt-4o", 1000, 0), 0.0);
    }

    #[test]
    fn custom_pricing() {
        let mut catalog = PricingCatalog::empty("USD");
        assert!(catalog.is_empty());

        catalog.set("custom/model", ModelRate::new(1.0, 2.0));
        assert_eq!(catalog.len(), 1);

        let cost = catalog.compute_cost("custom/model", 10, 10);
        assert!((cost - 30.0).abs() < 1e-10);
    }

    #[test]
    fn from_config_overrides_defaults() {
        let mut config = PricingConfig::default();
        config.models.insert(
            "gpt-4o".into(),
            RateConfig {
                input_rate: 0.01,
                output_rate: 0.02,
            },
        );
        config.models.insert(
            "local-llama".into(),
            RateConfig {
                input_rate: 0.0,
                output_rate: 0.0,
            },
        );

        let catalog = PricingCatalog::from_config(&config);
        assert_eq!(catalog.rate_for("gpt-4o"), (0.01, 0.02));
        assert!(catalog.contains("local-llama"));
        assert!(catalog.contains("o1"));
    }

    #[test]
    fn from_config_without_defaults() {
        let config = PricingConfig {
            currency: "USD".into(),
            include_defaults: false,
            ..PricingConfig::default()
        };
        let catalog = PricingCatalog::from_config(&config);
        assert!(catalog.is_empty());
        assert_eq!(catalog.currency(), "USD");
    }

    #[test]
    fn list_models() {
        let catalog = PricingCatalog::with_defaults();
        let models = catalog.models();
        assert!(models.contains(&"gpt-4o".to_string()));
        // Should be sorted
        assert!(models.windows(2).all(|w| w[0] <= w[1]));
    }
}
