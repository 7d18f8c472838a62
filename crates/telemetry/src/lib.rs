//! Interaction recording, pricing, and spend analytics for InferenceIQ.
//!
//! The [`InteractionRecorder`] wraps a provider and captures one record per
//! call. The [`LogStore`] persists records as JSON lines. The
//! [`MetricsEngine`] loads a log snapshot and answers cost, token,
//! reliability and caching questions over it.

pub mod metrics;
pub mod pricing;
pub mod recorder;
pub mod store;

pub use metrics::{
    CacheSavings, DEFAULT_CACHE_DISCOUNT, FailureStats, LatencyStats, MetricsEngine, TokenUsage,
    UsageReport,
};
pub use pricing::{ModelRate, PricingCatalog};
pub use recorder::{CallMetadata, InteractionRecorder};
pub use store::{LogSnapshot, LogStore, MalformedLinePolicy};

/// Round `value` to `places` decimal digits.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::round_to;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_to(1.005_f64 + 1e-9, 2), 1.01);
        assert_eq!(round_to(12.3456, 2), 12.35);
        assert_eq!(round_to(0.0, 4), 0.0);
    }
}
