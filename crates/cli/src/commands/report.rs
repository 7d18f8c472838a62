//! `inferenceiq report`: spend and usage analytics over the interaction log.

use inferenceiq_config::AppConfig;
use inferenceiq_telemetry::{
    LogStore, MalformedLinePolicy, MetricsEngine, PricingCatalog, UsageReport,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

pub fn run(
    config: &AppConfig,
    log_file: Option<PathBuf>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = log_file.unwrap_or_else(|| config.log_file.clone());
    let engine = build_engine(config)?;

    let snapshot = engine.load_required(&path)?;
    if snapshot.is_empty() {
        warn!(path = %path.display(), "No interactions to report");
    }

    let report = engine.summary();
    let mut stdout = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &report)?;
        writeln!(stdout)?;
    } else {
        render(&report, &mut stdout)?;
    }
    Ok(())
}

fn build_engine(config: &AppConfig) -> Result<MetricsEngine, String> {
    let policy: MalformedLinePolicy = config.store.on_malformed.parse()?;
    Ok(
        MetricsEngine::new(Arc::new(PricingCatalog::from_config(&config.pricing)))
            .with_cache_discount(config.metrics.cache_discount)
            .with_store(LogStore::with_policy(policy)),
    )
}

/// Human-readable report.
pub fn render(report: &UsageReport, out: &mut impl Write) -> std::io::Result<()> {
    let cur = &report.currency;

    writeln!(out, "📊 Usage Report")?;
    writeln!(out, "─────────────────────────────────────")?;
    writeln!(out, "  Interactions:   {}", report.record_count)?;
    writeln!(out, "  Total cost:     {} {:.4}", cur, report.total_cost)?;
    writeln!(out, "  Success rate:   {:.2}%", report.success_rate)?;
    writeln!(
        out,
        "  Failures:       {} ({:.2}%)",
        report.failure_stats.count, report.failure_stats.rate
    )?;
    writeln!(
        out,
        "  Tokens:         {} in / {} out / {} total",
        report.token_usage.total_input,
        report.token_usage.total_output,
        report.token_usage.grand_total
    )?;
    writeln!(
        out,
        "  Cache savings:  {} {:.4} over {} duplicate prompts",
        cur, report.cache_savings.potential_savings, report.cache_savings.duplicate_count
    )?;
    if report.latency.count > 0 {
        writeln!(
            out,
            "  Latency:        mean {:.2} ms, p50 {:.2} ms, p95 {:.2} ms, max {:.2} ms",
            report.latency.mean_ms, report.latency.p50_ms, report.latency.p95_ms, report.latency.max_ms
        )?;
    }

    if !report.cost_by_model.is_empty() {
        writeln!(out)?;
        writeln!(out, "{:<44} {:>14}", "Model", "Cost")?;
        for (model, cost) in &report.cost_by_model {
            writeln!(out, "{:<44} {:>14.4}", model, cost)?;
        }
    }

    if !report.cost_by_agent.is_empty() {
        writeln!(out)?;
        writeln!(out, "{:<44} {:>14}", "Agent", "Cost")?;
        for (agent, cost) in &report.cost_by_agent {
            writeln!(out, "{:<44} {:>14.4}", agent, cost)?;
        }
    }

    if !report.daily_trend.is_empty() {
        writeln!(out)?;
        writeln!(out, "{:<44} {:>14}", "Date", "Cost")?;
        for (day, cost) in &report.daily_trend {
            writeln!(out, "{:<44} {:>14.4}", day.to_string(), cost)?;
        }
    }

    Ok(())
}
