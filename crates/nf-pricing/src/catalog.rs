//! Static pricing catalog. Rates are illustrative defaults a host is
//! expected to override (spec.md §6: "no global configuration file is
//! mandated by the core") — the catalog is a read-only lookup, not a
//! billing source of truth.

use crate::types::{LengthBreakpoint, ModelPricing, ModelType, PricingTier, Provider, RateLimit};

macro_rules! pricing {
    ($model_id:expr, $provider:expr, $model_type:expr, $tier:expr, $description:expr $(, $field:ident = $value:expr)* $(,)?) => {
        ModelPricing {
            model_id: $model_id,
            provider: $provider,
            model_type: $model_type,
            tier: $tier,
            description: $description,
            price_per_1k_units: None,
            dimension: None,
            max_tokens: None,
            rate_limit: None,
            $($field: $value,)*
        }
    };
}

pub static MODEL_PRICING: &[ModelPricing] = &[
    pricing!(
        "gpt-4o",
        Provider::OpenAi,
        ModelType::Llm,
        PricingTier::Flat { input_per_1k: 0.0025, output_per_1k: 0.01 },
        "OpenAI flagship multimodal chat model",
        max_tokens = Some(128_000),
        rate_limit = Some(RateLimit { tpm: 800_000, rpm: 5_000 }),
    ),
    pricing!(
        "gpt-4o-mini",
        Provider::OpenAi,
        ModelType::Llm,
        PricingTier::Flat { input_per_1k: 0.00015, output_per_1k: 0.0006 },
        "OpenAI small, low-latency chat model",
        max_tokens = Some(128_000),
        rate_limit = Some(RateLimit { tpm: 2_000_000, rpm: 10_000 }),
    ),
    pricing!(
        "text-embedding-3-large",
        Provider::OpenAi,
        ModelType::Embedding,
        PricingTier::Flat { input_per_1k: 0.00013, output_per_1k: 0.0 },
        "OpenAI large embedding model",
        dimension = Some(3072),
    ),
    pricing!(
        "claude-3-5-sonnet-20241022",
        Provider::Anthropic,
        ModelType::Llm,
        PricingTier::Flat { input_per_1k: 0.003, output_per_1k: 0.015 },
        "Anthropic mid-tier chat model",
        max_tokens = Some(200_000),
        rate_limit = Some(RateLimit { tpm: 400_000, rpm: 4_000 }),
    ),
    pricing!(
        "claude-3-5-haiku-20241022",
        Provider::Anthropic,
        ModelType::Llm,
        PricingTier::Flat { input_per_1k: 0.0008, output_per_1k: 0.004 },
        "Anthropic small, fast chat model",
        max_tokens = Some(200_000),
        rate_limit = Some(RateLimit { tpm: 400_000, rpm: 4_000 }),
    ),
    pricing!(
        "gemini-1.5-pro",
        Provider::Gemini,
        ModelType::Llm,
        PricingTier::LengthTiered {
            breakpoints: &[
                LengthBreakpoint { prompt_tokens_above: 0, input_per_1k: 0.00125, output_per_1k: 0.005 },
                LengthBreakpoint { prompt_tokens_above: 128_000, input_per_1k: 0.0025, output_per_1k: 0.01 },
            ],
        },
        "Gemini flagship model; bills at a higher rate past 128k prompt tokens",
        max_tokens = Some(2_000_000),
        rate_limit = Some(RateLimit { tpm: 4_000_000, rpm: 1_000 }),
    ),
    pricing!(
        "gemini-1.5-flash",
        Provider::Gemini,
        ModelType::Llm,
        PricingTier::LengthTiered {
            breakpoints: &[
                LengthBreakpoint { prompt_tokens_above: 0, input_per_1k: 0.000075, output_per_1k: 0.0003 },
                LengthBreakpoint { prompt_tokens_above: 128_000, input_per_1k: 0.00015, output_per_1k: 0.0006 },
            ],
        },
        "Gemini small, fast model; bills at a higher rate past 128k prompt tokens",
        max_tokens = Some(1_000_000),
        rate_limit = Some(RateLimit { tpm: 4_000_000, rpm: 2_000 }),
    ),
    pricing!(
        "gemini-text-embedding-004",
        Provider::Gemini,
        ModelType::Embedding,
        PricingTier::Flat { input_per_1k: 0.0, output_per_1k: 0.0 },
        "Gemini embedding model (free tier at time of writing)",
        dimension = Some(768),
    ),
    pricing!(
        "voyage-3",
        Provider::VoyageAi,
        ModelType::Embedding,
        PricingTier::Flat { input_per_1k: 0.00006, output_per_1k: 0.0 },
        "Voyage general-purpose embedding model",
        dimension = Some(1024),
    ),
    pricing!(
        "rerank-2",
        Provider::Cohere,
        ModelType::Reranking,
        PricingTier::Flat { input_per_1k: 0.0, output_per_1k: 0.0 },
        "Cohere reranking model, billed per query+document unit",
        price_per_1k_units = Some(0.002),
    ),
];

/// Looks up a model's pricing by `(provider, model_id)`. `None` if the
/// catalog has no entry — callers fall back to a caller-supplied override
/// or treat cost as unknown (not zero).
pub fn lookup(provider: Provider, model_id: &str) -> Option<&'static ModelPricing> {
    MODEL_PRICING
        .iter()
        .find(|m| m.provider == provider && m.model_id == model_id)
}
