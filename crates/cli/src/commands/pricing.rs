//! `inferenceiq pricing` and `inferenceiq estimate`: the pricing catalog.

use inferenceiq_config::AppConfig;
use inferenceiq_telemetry::PricingCatalog;
use tracing::warn;

/// List every model with its per-token rates.
pub fn list(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = PricingCatalog::from_config(&config.pricing);
    let models = catalog.models();

    println!("💰 Model Pricing ({} per token)", catalog.currency());
    println!("─────────────────────────────────────────────────────────────────");
    println!("{:<44} {:>10} {:>10}", "Model", "Input", "Output");
    println!("{:<44} {:>10} {:>10}", "─────", "─────", "──────");

    for name in &models {
        let (input_rate, output_rate) = catalog.rate_for(name);
        println!("{:<44} {:>10.7} {:>10.7}", name, input_rate, output_rate);
    }

    println!();
    println!("  {} models with pricing data", models.len());

    Ok(())
}

/// Price a call of `model` with the given token counts.
pub fn estimate(
    config: &AppConfig,
    model: &str,
    tokens_in: u64,
    tokens_out: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = PricingCatalog::from_config(&config.pricing);

    if !catalog.contains(model) {
        warn!(model, "No pricing for model, cost is 0");
        println!("⚠ Model '{model}' not found in pricing catalog.");
        println!("  Use `inferenceiq pricing` to see available models.");
        return Ok(());
    }

    let cost = catalog.compute_cost(model, tokens_in, tokens_out);
    println!("💵 Cost estimate for {model}");
    println!("   Input tokens:   {tokens_in}");
    println!("   Output tokens:  {tokens_out}");
    println!("   Estimated cost: {} {:.6}", catalog.currency(), cost);

    Ok(())
}
