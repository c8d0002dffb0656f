//! Model pricing catalog: a read-only `(provider, model_id)` lookup table
//! producing per-1k-token rates and rate-limit hints, used by node cost
//! estimation and span cost computation (spec.md §4.2, §4.9).

pub mod catalog;
pub mod types;

pub use catalog::{lookup, MODEL_PRICING};
pub use types::{LengthBreakpoint, ModelPricing, ModelType, PricingTier, Provider, RateLimit};

/// Computes USD cost for a call against `model_id` under `provider`, given
/// token counts. `None` if the catalog has no entry for this model — the
/// caller decides whether to treat that as zero cost or as "unknown."
pub fn estimate_cost(
    provider: Provider,
    model_id: &str,
    prompt_tokens: u64,
    completion_tokens: u64,
) -> Option<f64> {
    let entry = lookup(provider, model_id)?;
    let (input_per_1k, output_per_1k) = entry.tier.rates_for_prompt(prompt_tokens);
    let input_cost = (prompt_tokens as f64 / 1000.0) * input_per_1k;
    let output_cost = (completion_tokens as f64 / 1000.0) * output_per_1k;
    Some(input_cost + output_cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_cost_known_model() {
        let cost = estimate_cost(Provider::OpenAi, "gpt-4o", 1000, 500).unwrap();
        assert!((cost - (0.0025 + 0.005)).abs() < 1e-9);
    }

    #[test]
    fn estimate_cost_unknown_model_is_none() {
        assert!(estimate_cost(Provider::OpenAi, "nonexistent", 1000, 500).is_none());
    }

    #[test]
    fn estimate_cost_zero_tokens_is_zero() {
        let cost = estimate_cost(Provider::OpenAi, "gpt-4o", 0, 0).unwrap();
        assert_eq!(cost, 0.0);
    }
}
