//! `inferenceiq route`: show which model a prompt would go to.

use inferenceiq_config::AppConfig;
use inferenceiq_providers::{ComplexityRouter, RouteDecision};

pub fn run(
    config: &AppConfig,
    prompt: &str,
    strong: Option<String>,
    weak: Option<String>,
    threshold: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let decision = decide(config, prompt, strong, weak, threshold);
    println!("🧭 {} ({})", decision.model, decision.reason);
    Ok(())
}

/// Route `prompt`, with command-line flags taking precedence over config.
fn decide(
    config: &AppConfig,
    prompt: &str,
    strong: Option<String>,
    weak: Option<String>,
    threshold: Option<usize>,
) -> RouteDecision {
    let router = match threshold {
        Some(threshold) => ComplexityRouter::new(threshold),
        None => ComplexityRouter::from_config(&config.router),
    };
    let strong = strong.unwrap_or_else(|| config.router.strong_model.clone());
    let weak = weak.unwrap_or_else(|| config.router.weak_model.clone());
    router.route(prompt, &strong, &weak)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inferenceiq_providers::RouteReason;

    #[test]
    fn uses_configured_models() {
        let config = AppConfig::default();
        let decision = decide(&config, "hi", None, None, None);
        assert_eq!(decision.model, config.router.weak_model);
        assert_eq!(decision.reason, RouteReason::ComplexityLow);

        let decision = decide(&config, "debug this", None, None, None);
        assert_eq!(decision.model, config.router.strong_model);
    }

    #[test]
    fn flags_override_config() {
        let config = AppConfig::default();
        let decision = decide(&config, "hello", Some("big".into()), Some("small".into()), Some(3));
        assert_eq!(decision.model, "big");
        assert_eq!(decision.reason, RouteReason::ComplexityHigh);
    }
}
