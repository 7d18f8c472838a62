//! Complexity router: picks a strong or a weak model for a prompt.
//!
//! A prompt is complex when it is longer than the configured threshold or
//! mentions one of a fixed set of task keywords. The router holds nothing
//! but its threshold, so one instance can be shared freely across tasks.

use inferenceiq_config::RouterConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default prompt length, in characters, above which a prompt is complex.
pub const DEFAULT_LENGTH_THRESHOLD: usize = 100;

/// Substrings that mark a prompt as needing the stronger model.
pub const COMPLEX_KEYWORDS: [&str; 13] = [
    "explain",
    "analyze",
    "summarize",
    "code",
    "debug",
    "reason",
    "why",
    "how",
    "compare",
    "evaluate",
    "json",
    "script",
    "python",
];

/// Why a model was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteReason {
    ComplexityHigh,
    ComplexityLow,
}

impl std::fmt::Display for RouteReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ComplexityHigh => write!(f, "complexity_high"),
            Self::ComplexityLow => write!(f, "complexity_low"),
        }
    }
}

/// The model a prompt should go to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDecision {
    pub model: String,
    pub reason: RouteReason,
}

/// Rule-based router between a stronger and a cheaper model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplexityRouter {
    length_threshold: usize,
}

impl ComplexityRouter {
    pub fn new(length_threshold: usize) -> Self {
        Self { length_threshold }
    }

    pub fn from_config(config: &RouterConfig) -> Self {
        Self::new(config.length_threshold)
    }

    pub fn length_threshold(&self) -> usize {
        self.length_threshold
    }

    /// Whether `prompt` is long or mentions a complexity keyword.
    ///
    /// Length counts characters, not bytes. Keywords match anywhere in the
    /// lowercased prompt, so "show" matches "how".
    pub fn is_complex(&self, prompt: &str) -> bool {
        if prompt.chars().count() > self.length_threshold {
            return true;
        }
        let lowered = prompt.to_lowercase();
        COMPLEX_KEYWORDS.iter().any(|kw| lowered.contains(kw))
    }

    /// Pick `strong_model` for complex prompts and `weak_model` otherwise.
    pub fn route(&self, prompt: &str, strong_model: &str, weak_model: &str) -> RouteDecision {
        let decision = if self.is_complex(prompt) {
            RouteDecision {
                model: strong_model.to_string(),
                reason: RouteReason::ComplexityHigh,
            }
        } else {
            RouteDecision {
                model: weak_model.to_string(),
                reason: RouteReason::ComplexityLow,
            }
        };
        debug!(model = %decision.model, reason = %decision.reason, "Prompt routed");
        decision
    }
}

impl Default for ComplexityRouter {
    fn default() -> Self {
        Self::new(DEFAULT_LENGTH_THRESHOLD)
    }
}
