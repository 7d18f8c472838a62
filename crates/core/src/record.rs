//! The interaction record: one line of the cost log.
//!
//! Records are schema-light on purpose: every numeric field is optional and
//! reads as zero when absent, unknown keys survive a load/save cycle as
//! caller metadata, and `outcome` keeps values it does not recognise.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, SecondsFormat};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Every field name the log format defines, in column order.
pub const CANONICAL_FIELDS: [&str; 12] = [
    "timestamp",
    "interaction_id",
    "agent",
    "model",
    "tokens_in",
    "tokens_out",
    "tokens_total",
    "cost",
    "latency_ms",
    "outcome",
    "error",
    "fingerprint",
];

/// Legacy spelling of `cost`, still accepted on load.
const LEGACY_COST_FIELD: &str = "cost_inr";

/// Whether caller metadata may not use `key`.
pub fn is_reserved(key: &str) -> bool {
    key == LEGACY_COST_FIELD || CANONICAL_FIELDS.contains(&key)
}

// ── Timestamp ─────────────────────────────────────────────────────────────

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const NAIVE_FORMAT_SPACED: &str = "%Y-%m-%d %H:%M:%S%.f";

/// When a call happened, exactly as it was written to the log.
///
/// Timestamps are never converted between zones. A record written with an
/// offset keeps it; a naive timestamp stays naive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// ISO-8601 with a UTC offset.
    Zoned(DateTime<FixedOffset>),
    /// ISO-8601 without an offset.
    Naive(NaiveDateTime),
}

impl Timestamp {
    /// The current local wall-clock time, with its offset.
    pub fn now() -> Self {
        Self::Zoned(Local::now().fixed_offset())
    }

    /// Calendar date in the timestamp's own representation.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Zoned(dt) => dt.date_naive(),
            Self::Naive(dt) => dt.date(),
        }
    }

    /// Parse an RFC 3339 timestamp, falling back to naive ISO-8601.
    pub fn parse(s: &str) -> Result<Self, chrono::ParseError> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::Zoned(dt));
        }
        NaiveDateTime::parse_from_str(s, NAIVE_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(s, NAIVE_FORMAT_SPACED))
            .map(Self::Naive)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Zoned(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
            Self::Naive(dt) => write!(f, "{}", dt.format(NAIVE_FORMAT)),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(|e| serde::de::Error::custom(format!("{raw:?}: {e}")))
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────

/// Success/failed classification of one provider call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Outcome {
    Success,
    Failed,
    /// Any other value found in a log, kept verbatim.
    Other(String),
}

impl Default for Outcome {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for Outcome {
    fn from(value: String) -> Self {
        match value.as_str() {
            "success" => Self::Success,
            "failed" => Self::Failed,
            _ => Self::Other(value),
        }
    }
}

impl From<Outcome> for String {
    fn from(value: Outcome) -> Self {
        match value {
            Outcome::Success => "success".into(),
            Outcome::Failed => "failed".into(),
            Outcome::Other(s) => s,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

// ── Record ────────────────────────────────────────────────────────────────

/// One provider call: who made it, what it cost, how long it took.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// When the call was made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    /// Unique per call.
    #[serde(default)]
    pub interaction_id: String,
    /// The logical caller.
    #[serde(default)]
    pub agent: String,
    /// Provider-specific model identifier.
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_out: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_total: Option<u64>,
    /// Cost in the pricing catalog's currency.
    #[serde(default, alias = "cost_inr", skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// Wall-clock call duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    #[serde(default)]
    pub outcome: Outcome,
    /// Provider error message; present iff the call failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Caller-computed prompt hash for duplicate detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Caller metadata (`user_id`, `session_id`, `tags`, ...).
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl InteractionRecord {
    fn base(agent: &str, model: &str, outcome: Outcome, latency_ms: f64) -> Self {
        Self {
            timestamp: Some(Timestamp::now()),
            interaction_id: format!("int_{}", Uuid::new_v4().simple()),
            agent: agent.to_string(),
            model: model.to_string(),
            tokens_in: None,
            tokens_out: None,
            tokens_total: None,
            cost: None,
            latency_ms: Some(latency_ms),
            outcome,
            error: None,
            fingerprint: None,
            metadata: serde_json::Map::new(),
        }
    }

    /// A successful call stamped with the current time.
    pub fn success(
        agent: &str,
        model: &str,
        tokens_in: u64,
        tokens_out: u64,
        cost: f64,
        latency_ms: f64,
    ) -> Self {
        Self {
            tokens_in: Some(tokens_in),
            tokens_out: Some(tokens_out),
            tokens_total: Some(tokens_in.saturating_add(tokens_out)),
            cost: Some(cost),
            ..Self::base(agent, model, Outcome::Success, latency_ms)
        }
    }

    /// A failed call. Carries no token or cost fields.
    pub fn failure(agent: &str, model: &str, error: impl Into<String>, latency_ms: f64) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::base(agent, model, Outcome::Failed, latency_ms)
        }
    }

    /// Set the duplicate-detection fingerprint.
    pub fn with_fingerprint(mut self, fingerprint: Option<String>) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    /// Merge caller metadata, refusing reserved keys.
    ///
    /// Returns the keys that were dropped.
    pub fn merge_metadata(
        &mut self,
        fields: serde_json::Map<String, serde_json::Value>,
    ) -> Vec<String> {
        let mut rejected = Vec::new();
        for (key, value) in fields {
            if is_reserved(&key) {
                rejected.push(key);
            } else {
                self.metadata.insert(key, value);
            }
        }
        rejected
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    pub fn is_failed(&self) -> bool {
        self.outcome == Outcome::Failed
    }

    /// Cost as seen by aggregations: zero for failures and missing values.
    pub fn billed_cost(&self) -> f64 {
        if self.is_failed() {
            0.0
        } else {
            self.cost.unwrap_or(0.0)
        }
    }

    /// Input tokens as seen by aggregations.
    pub fn billed_tokens_in(&self) -> u64 {
        if self.is_failed() {
            0
        } else {
            self.tokens_in.unwrap_or(0)
        }
    }

    /// Output tokens as seen by aggregations.
    pub fn billed_tokens_out(&self) -> u64 {
        if self.is_failed() {
            0
        } else {
            self.tokens_out.unwrap_or(0)
        }
    }
}
