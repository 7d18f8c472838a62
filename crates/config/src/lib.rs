//! Configuration loading, validation, and management for InferenceIQ.
//!
//! Loads configuration from `~/.inferenceiq/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.inferenceiq/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Interaction log path
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Logical caller name stamped on every record
    #[serde(default = "default_agent")]
    pub agent: String,

    /// Model pricing
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Complexity routing
    #[serde(default)]
    pub router: RouterConfig,

    /// Metrics policy constants
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Log store behaviour
    #[serde(default)]
    pub store: StoreConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("genai_costs.jsonl")
}
fn default_agent() -> String {
    "default".into()
}
fn default_true() -> bool {
    true
}

/// Per-token pricing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Currency label for every rate in the catalog
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Start from the built-in catalog before applying `models`
    #[serde(default = "default_true")]
    pub include_defaults: bool,

    /// Per-model overrides and additions
    #[serde(default)]
    pub models: HashMap<String, RateConfig>,
}

fn default_currency() -> String {
    "INR".into()
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            include_defaults: true,
            models: HashMap::new(),
        }
    }
}

/// Rates in currency per token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateConfig {
    pub input_rate: f64,
    pub output_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Prompts longer than this (in characters) count as complex
    #[serde(default = "default_length_threshold")]
    pub length_threshold: usize,

    #[serde(default = "default_strong_model")]
    pub strong_model: String,

    #[serde(default = "default_weak_model")]
    pub weak_model: String,
}

fn default_length_threshold() -> usize {
    100
}
fn default_strong_model() -> String {
    "gpt-4o".into()
}
fn default_weak_model() -> String {
    "gpt-4o-mini".into()
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            length_threshold: default_length_threshold(),
            strong_model: default_strong_model(),
            weak_model: default_weak_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Fraction of a duplicate call's input cost a cache would have saved
    #[serde(default = "default_cache_discount")]
    pub cache_discount: f64,
}

fn default_cache_discount() -> f64 {
    0.90
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            cache_discount: default_cache_discount(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// What to do with a malformed log line: "discard_all" or "skip_line"
    #[serde(default = "default_on_malformed")]
    pub on_malformed: String,
}

fn default_on_malformed() -> String {
    "discard_all".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            on_malformed: default_on_malformed(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.inferenceiq/config.toml).
    ///
    /// Environment overrides:
    /// - `INFERENCEIQ_LOG_FILE`, `INFERENCEIQ_AGENT`
    /// - `OPENAI_API_KEY`, `ANTHROPIC_API_KEY` when the provider has no key
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(log_file) = var("INFERENCEIQ_LOG_FILE") {
            self.log_file = PathBuf::from(log_file);
        }
        if let Some(agent) = var("INFERENCEIQ_AGENT") {
            self.agent = agent;
        }
        for (provider, env_key) in [("openai", "OPENAI_API_KEY"), ("anthropic", "ANTHROPIC_API_KEY")] {
            let entry = self.providers.entry(provider.to_string()).or_default();
            if entry.api_key.is_none() {
                entry.api_key = var(env_key);
            }
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".inferenceiq")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        for (model, rate) in &self.pricing.models {
            if !(rate.input_rate >= 0.0 && rate.output_rate >= 0.0) {
                return Err(ConfigError::ValidationError(format!(
                    "pricing for '{model}' must have non-negative rates"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.metrics.cache_discount) {
            return Err(ConfigError::ValidationError(
                "metrics.cache_discount must be between 0.0 and 1.0".into(),
            ));
        }

        if !matches!(self.store.on_malformed.as_str(), "discard_all" | "skip_line") {
            return Err(ConfigError::ValidationError(format!(
                "store.on_malformed must be \"discard_all\" or \"skip_line\", got \"{}\"",
                self.store.on_malformed
            )));
        }

        Ok(())
    }

    /// Look up a provider section by name.
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            agent: default_agent(),
            pricing: PricingConfig::default(),
            router: RouterConfig::default(),
            metrics: MetricsConfig::default(),
            store: StoreConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.log_file, PathBuf::from("genai_costs.jsonl"));
        assert_eq!(config.router.length_threshold, 100);
        assert!((config.metrics.cache_discount - 0.90).abs() < 1e-12);
        assert_eq!(config.store.on_malformed, "discard_all");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.agent, config.agent);
        assert_eq!(parsed.router.strong_model, config.router.strong_model);
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().agent, "default");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
log_file = "logs/costs.jsonl"

[pricing.models."my-model"]
input_rate = 0.001
output_rate = 0.002

[router]
length_threshold = 40
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.log_file, PathBuf::from("logs/costs.jsonl"));
        assert_eq!(config.router.length_threshold, 40);
        assert_eq!(config.router.weak_model, "gpt-4o-mini");
        assert!(config.pricing.include_defaults);
        assert!((config.pricing.models["my-model"].output_rate - 0.002).abs() < 1e-12);
    }

    #[test]
    fn negative_rate_rejected() {
        let mut config = AppConfig::default();
        config.pricing.models.insert(
            "bad".into(),
            RateConfig {
                input_rate: -1.0,
                output_rate: 0.0,
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_cache_discount_rejected() {
        let mut config = AppConfig::default();
        config.metrics.cache_discount = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_malformed_policy_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store]\non_malformed = \"ignore\"").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unparseable_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_file = [").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "anthropic".into(),
            ProviderConfig {
                api_key: Some("from-file".into()),
                api_url: None,
            },
        );
        config.apply_overrides(|name| match name {
            "INFERENCEIQ_AGENT" => Some("batch-job".into()),
            "OPENAI_API_KEY" => Some("sk-env".into()),
            "ANTHROPIC_API_KEY" => Some("sk-ant-env".into()),
            _ => None,
        });

        assert_eq!(config.agent, "batch-job");
        assert_eq!(config.log_file, PathBuf::from("genai_costs.jsonl"));
        assert_eq!(config.provider("openai").unwrap().api_key.as_deref(), Some("sk-env"));
        // File value wins over the environment
        assert_eq!(
            config.provider("anthropic").unwrap().api_key.as_deref(),
            Some("from-file")
        );
    }

    #[test]
    fn debug_redacts_api_keys() {
        let provider = ProviderConfig {
            api_key: Some("sk-secret".into()),
            api_url: None,
        };
        let debug = format!("{provider:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("genai_costs.jsonl"));
        assert!(toml_str.contains("gpt-4o-mini"));
    }
}
