//! Pricing data shapes, grounded on the `ModelPricing`/`RateLimit` dataclasses
//! and `Provider`/`ModelType` enums.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    VoyageAi,
    OpenAi,
    Anthropic,
    Cohere,
    HuggingFace,
    Gemini,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Embedding,
    Reranking,
    Llm,
}

/// Tokens/requests-per-minute hint surfaced alongside a model's rate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimit {
    pub tpm: u64,
    pub rpm: u64,
}

/// A single pricing tier: flat per-1k-token rates, or a breakpoint schedule
/// keyed by prompt length (Gemini's convention — prompts above the
/// threshold bill at the higher rate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PricingTier {
    Flat {
        input_per_1k: f64,
        output_per_1k: f64,
    },
    /// Breakpoints sorted ascending by `prompt_tokens_above`. The rate used
    /// is the last breakpoint whose threshold the prompt length meets or
    /// exceeds; a prompt shorter than every breakpoint uses the first.
    LengthTiered {
        breakpoints: &'static [LengthBreakpoint],
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LengthBreakpoint {
    pub prompt_tokens_above: u64,
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl PricingTier {
    /// Resolves the effective per-1k-token rates for a prompt of
    /// `prompt_tokens` length.
    pub fn rates_for_prompt(&self, prompt_tokens: u64) -> (f64, f64) {
        match self {
            PricingTier::Flat {
                input_per_1k,
                output_per_1k,
            } => (*input_per_1k, *output_per_1k),
            PricingTier::LengthTiered { breakpoints } => {
                let mut chosen = breakpoints.first();
                for bp in breakpoints.iter() {
                    if prompt_tokens >= bp.prompt_tokens_above {
                        chosen = Some(bp);
                    }
                }
                match chosen {
                    Some(bp) => (bp.input_per_1k, bp.output_per_1k),
                    None => (0.0, 0.0),
                }
            }
        }
    }
}

/// Pricing and capability metadata for one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPricing {
    pub model_id: &'static str,
    pub provider: Provider,
    pub model_type: ModelType,
    pub tier: PricingTier,
    /// Per-1k-units rate for reranking models (units = query + documents).
    /// `None` for embedding/LLM models.
    pub price_per_1k_units: Option<f64>,
    pub dimension: Option<u32>,
    pub max_tokens: Option<u64>,
    pub rate_limit: Option<RateLimit>,
    pub description: &'static str,
}
