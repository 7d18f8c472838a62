//! Metrics engine: spend and usage analytics over a loaded log.
//!
//! All queries are pure views over an immutable [`LogSnapshot`]. The engine
//! holds the current snapshot behind an `Arc`; a reload builds a fresh one
//! and swaps the reference, so a reader that already grabbed the old
//! snapshot keeps seeing a complete, unchanged dataset.

use crate::pricing::PricingCatalog;
use crate::round_to;
use crate::store::{LogSnapshot, LogStore};
use chrono::NaiveDate;
use inferenceiq_core::error::StoreError;
use inferenceiq_core::record::InteractionRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Fraction of a duplicate call's input cost a prompt cache would save.
pub const DEFAULT_CACHE_DISCOUNT: f64 = 0.90;

// ── Aggregated views ──────────────────────────────────────────────────────

/// Token totals across all records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub total_input: u64,
    pub total_output: u64,
    pub grand_total: u64,
}

/// Failure count and percentage (2 decimals).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FailureStats {
    pub count: usize,
    pub rate: f64,
}

/// What a prompt cache would have saved on duplicate fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CacheSavings {
    pub duplicate_count: usize,
    /// Rounded to 4 decimals.
    pub potential_savings: f64,
}

/// Latency distribution over records that carry a latency.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatencyStats {
    pub count: usize,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub max_ms: f64,
}

/// Every view at once, for reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageReport {
    pub currency: String,
    pub record_count: usize,
    pub total_cost: f64,
    pub cost_by_model: BTreeMap<String, f64>,
    pub cost_by_agent: BTreeMap<String, f64>,
    pub token_usage: TokenUsage,
    pub daily_trend: BTreeMap<NaiveDate, f64>,
    pub success_rate: f64,
    pub failure_stats: FailureStats,
    pub cache_savings: CacheSavings,
    pub latency: LatencyStats,
}

impl LogSnapshot {
    /// Sum of cost over all records.
    pub fn total_cost(&self) -> f64 {
        self.records().iter().map(|r| r.billed_cost()).sum()
    }

    /// Summed cost per model. Every model in the log gets a key.
    pub fn cost_by_model(&self) -> BTreeMap<String, f64> {
        let mut by_model = BTreeMap::new();
        for record in self.records() {
            *by_model.entry(record.model.clone()).or_insert(0.0) += record.billed_cost();
        }
        by_model
    }

    /// Summed cost per agent.
    pub fn cost_by_agent(&self) -> BTreeMap<String, f64> {
        let mut by_agent = BTreeMap::new();
        for record in self.records() {
            *by_agent.entry(record.agent.clone()).or_insert(0.0) += record.billed_cost();
        }
        by_agent
    }

    /// Token totals over successes. Sums saturate at `u64::MAX`.
    pub fn token_usage(&self) -> TokenUsage {
        let sum = |tokens: fn(&InteractionRecord) -> u64| {
            self.records()
                .iter()
                .map(tokens)
                .fold(0u64, u64::saturating_add)
        };
        let total_input = sum(InteractionRecord::billed_tokens_in);
        let total_output = sum(InteractionRecord::billed_tokens_out);
        TokenUsage {
            total_input,
            total_output,
            grand_total: total_input.saturating_add(total_output),
        }
    }

    /// Summed cost per calendar date, in each timestamp's own zone.
    ///
    /// A date appears iff some record falls on it, even at zero cost.
    pub fn daily_trend(&self) -> BTreeMap<NaiveDate, f64> {
        let mut by_day = BTreeMap::new();
        for record in self.records() {
            if let Some(ts) = &record.timestamp {
                *by_day.entry(ts.date()).or_insert(0.0) += record.billed_cost();
            }
        }
        by_day
    }

    /// Percentage of successful records; 0 for an empty log.
    ///
    /// Unrounded. Added to the rounded rate from [`Self::failure_stats`] it
    /// reaches 100 only to within 0.005 when every record is a success or a
    /// failure.
    pub fn success_rate(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let success = self.records().iter().filter(|r| r.is_success()).count();
        success as f64 / self.len() as f64 * 100.0
    }

    /// Failure count and percentage, the percentage rounded to 2 decimals.
    pub fn failure_stats(&self) -> FailureStats {
        if self.is_empty() {
            return FailureStats::default();
        }
        let count = self.records().iter().filter(|r| r.is_failed()).count();
        FailureStats {
            count,
            rate: round_to(count as f64 / self.len() as f64 * 100.0, 2),
        }
    }

    /// Estimate savings had duplicate prompts been served from a cache.
    ///
    /// Only successes count. The first record carrying a fingerprint, in log
    /// order, is the original; each later one is a duplicate that would have
    /// saved `discount` of its input cost. Output is never assumed cached.
    pub fn cache_savings_estimate(&self, pricing: &PricingCatalog, discount: f64) -> CacheSavings {
        let mut seen = HashSet::new();
        let mut duplicate_count = 0;
        let mut savings = 0.0;

        for record in self.records().iter().filter(|r| r.is_success()) {
            let Some(fingerprint) = record.fingerprint.as_deref() else {
                continue;
            };
            if seen.insert(fingerprint) {
                continue;
            }
            duplicate_count += 1;
            let (input_rate, _) = pricing.rate_for(&record.model);
            savings += discount * record.tokens_in.unwrap_or(0) as f64 * input_rate;
        }

        CacheSavings {
            duplicate_count,
            potential_savings: round_to(savings, 4),
        }
    }

    pub fn latency_stats(&self) -> LatencyStats {
        let mut latencies: Vec<f64> = self.records().iter().filter_map(|r| r.latency_ms).collect();
        if latencies.is_empty() {
            return LatencyStats::default();
        }
        latencies.sort_by(f64::total_cmp);

        let count = latencies.len();
        let mean = latencies.iter().sum::<f64>() / count as f64;
        LatencyStats {
            count,
            mean_ms: round_to(mean, 2),
            p50_ms: nearest_rank(&latencies, 50.0),
            p95_ms: nearest_rank(&latencies, 95.0),
            max_ms: latencies[count - 1],
        }
    }
}

/// Nearest-rank percentile of a sorted, non-empty slice.
fn nearest_rank(sorted: &[f64], percentile: f64) -> f64 {
    let rank = (percentile / 100.0 * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

// ── Engine ────────────────────────────────────────────────────────────────

/// Loads the interaction log and answers analytics queries over it.
pub struct MetricsEngine {
    pricing: Arc<PricingCatalog>,
    cache_discount: f64,
    store: LogStore,
    current: RwLock<Arc<LogSnapshot>>,
}

impl MetricsEngine {
    /// An engine with an empty snapshot.
    pub fn new(pricing: Arc<PricingCatalog>) -> Self {
        Self {
            pricing,
            cache_discount: DEFAULT_CACHE_DISCOUNT,
            store: LogStore::new(),
            current: RwLock::new(Arc::new(LogSnapshot::empty())),
        }
    }

    pub fn with_cache_discount(mut self, discount: f64) -> Self {
        self.cache_discount = discount;
        self
    }

    pub fn with_store(mut self, store: LogStore) -> Self {
        self.store = store;
        self
    }

    pub fn pricing(&self) -> &PricingCatalog {
        &self.pricing
    }

    /// Load `path` into a new snapshot and make it current.
    pub fn load(&self, path: &Path) -> Arc<LogSnapshot> {
        self.load_with(&self.store, path)
    }

    /// Load `path` through `store` instead of the engine's own.
    pub fn load_with(&self, store: &LogStore, path: &Path) -> Arc<LogSnapshot> {
        self.replace(store.load(path))
    }

    /// Like [`load`](Self::load), but a missing file is an error and the
    /// current snapshot is left in place.
    pub fn load_required(&self, path: &Path) -> Result<Arc<LogSnapshot>, StoreError> {
        let snapshot = self.store.load_required(path)?;
        Ok(self.replace(snapshot))
    }

    /// Make `snapshot` current and return it.
    pub fn replace(&self, snapshot: LogSnapshot) -> Arc<LogSnapshot> {
        let fresh = Arc::new(snapshot);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&fresh);
        info!(records = fresh.len(), "Metrics snapshot reloaded");
        fresh
    }

    /// The snapshot queries currently run against.
    pub fn snapshot(&self) -> Arc<LogSnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    // ── Queries ───────────────────────────────────────────────────────

    pub fn total_cost(&self) -> f64 {
        self.snapshot().total_cost()
    }

    pub fn cost_by_model(&self) -> BTreeMap<String, f64> {
        self.snapshot().cost_by_model()
    }

    pub fn cost_by_agent(&self) -> BTreeMap<String, f64> {
        self.snapshot().cost_by_agent()
    }

    pub fn token_usage(&self) -> TokenUsage {
        self.snapshot().token_usage()
    }

    pub fn daily_trend(&self) -> BTreeMap<NaiveDate, f64> {
        self.snapshot().daily_trend()
    }

    pub fn success_rate(&self) -> f64 {
        self.snapshot().success_rate()
    }

    pub fn failure_stats(&self) -> FailureStats {
        self.snapshot().failure_stats()
    }

    pub fn cache_savings_estimate(&self) -> CacheSavings {
        self.snapshot()
            .cache_savings_estimate(&self.pricing, self.cache_discount)
    }

    pub fn latency_stats(&self) -> LatencyStats {
        self.snapshot().latency_stats()
    }

    /// Every view, computed against one snapshot.
    pub fn summary(&self) -> UsageReport {
        let snapshot = self.snapshot();
        UsageReport {
            currency: self.pricing.currency().to_string(),
            record_count: snapshot.len(),
            total_cost: snapshot.total_cost(),
            cost_by_model: snapshot.cost_by_model(),
            cost_by_agent: snapshot.cost_by_agent(),
            token_usage: snapshot.token_usage(),
            daily_trend: snapshot.daily_trend(),
            success_rate: snapshot.success_rate(),
            failure_stats: snapshot.failure_stats(),
            cache_savings: snapshot.cache_savings_estimate(&self.pricing, self.cache_discount),
            latency: snapshot.latency_stats(),
        }
    }
}
