//! Span evaluator (§4.9): a pure, stateless function dispatched on
//! `span_type`, near-verbatim generalization of
//! `examples/original_source/backend/core/span_evaluator.py`'s
//! `SpanEvaluator`, including its exact warning thresholds.

use serde_json::{json, Value};

use nf_domain::{Span, SpanType};

/// Evaluates a span and returns its evaluation map. Safe to call at any
/// point in a span's lifecycle; typically invoked once per span before
/// `complete_trace`.
pub fn evaluate_span(span: &Span) -> Value {
    match span.span_type {
        SpanType::Embedding => evaluate_embedding(span),
        SpanType::VectorSearch => evaluate_vector_search(span),
        SpanType::Reranking => evaluate_reranking(span),
        SpanType::Llm => evaluate_llm(span),
        SpanType::Chunking => evaluate_chunking(span),
        _ => evaluate_generic(span),
    }
}

fn duration_secs(span: &Span) -> Option<f64> {
    span.duration_ms().map(|ms| ms as f64 / 1000.0)
}

fn embedding_count(span: &Span) -> u64 {
    span.metadata
        .get("embedding_count")
        .and_then(Value::as_u64)
        .unwrap_or(1)
}

fn evaluate_embedding(span: &Span) -> Value {
    let duration_ms = span.duration_ms().unwrap_or(0);
    let count = embedding_count(span).max(1);
    let per_second = duration_secs(span).filter(|s| *s > 0.0).map(|s| count as f64 / s).unwrap_or(0.0);
    let cost_per_embedding = span.cost / count as f64;

    let mut eval = json!({
        "embedding_count": count,
        "embedding_dimension": span.metadata.get("dimension"),
        "embedding_time_ms": duration_ms,
        "embeddings_per_second": per_second,
        "cost_per_embedding": cost_per_embedding,
        "model": span.model,
        "provider": span.provider,
    });
    if duration_ms > 1000 {
        eval["performance_warning"] = json!("embedding took longer than 1s");
    }
    if cost_per_embedding > 0.001 {
        eval["cost_warning"] = json!("cost per embedding is high");
    }
    eval
}

fn evaluate_vector_search(span: &Span) -> Value {
    let results = span.outputs.get("results").and_then(Value::as_array).cloned().unwrap_or_default();
    let scores: Vec<f64> = results
        .iter()
        .filter_map(|r| r.get("score").and_then(Value::as_f64))
        .collect();
    let results_count = results.len();
    let avg_score = if scores.is_empty() { 0.0 } else { scores.iter().sum::<f64>() / scores.len() as f64 };
    let min_score = scores.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_score = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let duration_ms = span.duration_ms().unwrap_or(0);

    let mut eval = json!({
        "results_count": results_count,
        "avg_relevance_score": avg_score,
        "min_relevance_score": if scores.is_empty() { 0.0 } else { min_score },
        "max_relevance_score": if scores.is_empty() { 0.0 } else { max_score },
        "search_time_ms": duration_ms,
        "top_k": span.metadata.get("top_k"),
        "provider": span.provider,
    });
    if avg_score < 0.5 {
        eval["quality_warning"] = json!("low average relevance score");
    }
    if results_count == 0 {
        eval["quality_warning"] = json!("no results retrieved");
    }
    if duration_ms > 500 {
        eval["performance_warning"] = json!("search took longer than 500ms");
    }
    eval
}

fn evaluate_reranking(span: &Span) -> Value {
    let results = span.outputs.get("results").and_then(Value::as_array).cloned().unwrap_or_default();
    let reranked_count = span.metadata.get("reranked_count").and_then(Value::as_u64).unwrap_or(results.len() as u64);
    let original_count = span.metadata.get("original_count").and_then(Value::as_u64).unwrap_or(reranked_count);

    let original_scores: Vec<f64> = results.iter().filter_map(|r| r.get("original_score").and_then(Value::as_f64)).collect();
    let rerank_scores: Vec<f64> = results.iter().filter_map(|r| r.get("rerank_score").and_then(Value::as_f64)).collect();
    let avg_original = if original_scores.is_empty() { 0.0 } else { original_scores.iter().sum::<f64>() / original_scores.len() as f64 };
    let avg_rerank = if rerank_scores.is_empty() { 0.0 } else { rerank_scores.iter().sum::<f64>() / rerank_scores.len() as f64 };
    let improvement = avg_rerank - avg_original;
    let improvement_pct = if avg_original > 0.0 { improvement / avg_original * 100.0 } else { 0.0 };
    let duration_ms = span.duration_ms().unwrap_or(0);

    let mut eval = json!({
        "original_count": original_count,
        "reranked_count": reranked_count,
        "final_count": results.len(),
        "avg_original_score": avg_original,
        "avg_rerank_score": avg_rerank,
        "score_improvement": improvement,
        "improvement_pct": improvement_pct,
        "reranking_time_ms": duration_ms,
        "method": span.metadata.get("method"),
        "cost": span.cost,
    });
    if improvement < 0.0 {
        eval["quality_warning"] = json!("reranking decreased scores");
    }
    if duration_ms > 1000 {
        eval["performance_warning"] = json!("reranking took longer than 1s");
    }
    eval
}

fn evaluate_llm(span: &Span) -> Value {
    let (input_tokens, output_tokens, total_tokens) = (span.tokens.input, span.tokens.output, span.tokens.total);
    let duration_ms = span.duration_ms().unwrap_or(0);
    let tokens_per_second = duration_secs(span)
        .filter(|s| *s > 0.0)
        .map(|s| total_tokens as f64 / s)
        .unwrap_or(0.0);
    let cost_per_token = if total_tokens > 0 { span.cost / total_tokens as f64 } else { 0.0 };
    let cost_per_input_token = if input_tokens > 0 { span.cost / input_tokens as f64 } else { 0.0 };
    let cost_per_output_token = if output_tokens > 0 { span.cost / output_tokens as f64 } else { 0.0 };

    let mut eval = json!({
        "input_tokens": input_tokens,
        "output_tokens": output_tokens,
        "total_tokens": total_tokens,
        "cost": span.cost,
        "cost_per_token": cost_per_token,
        "cost_per_input_token": cost_per_input_token,
        "cost_per_output_token": cost_per_output_token,
        "latency_ms": duration_ms,
        "tokens_per_second": tokens_per_second,
        "model": span.model,
        "provider": span.provider,
        "temperature": span.metadata.get("temperature"),
    });
    if duration_ms > 5000 {
        eval["performance_warning"] = json!("LLM response took longer than 5s");
    }
    if tokens_per_second < 10.0 {
        eval["performance_warning"] = json!("low token generation rate");
    }
    if span.cost > 0.01 {
        eval["cost_warning"] = json!("high cost per request");
    }
    if let Some(remaining) = span.api_limits.remaining {
        if remaining < 100 {
            eval["api_limit_warning"] = json!(format!("low API limit remaining: {remaining}"));
        }
    }
    eval
}

fn evaluate_chunking(span: &Span) -> Value {
    let chunks_created = span.metadata.get("chunks_created").and_then(Value::as_u64).unwrap_or(0);
    let chunk_size = span.metadata.get("chunk_size").and_then(Value::as_u64).unwrap_or(0);
    let chunk_overlap = span.metadata.get("chunk_overlap").and_then(Value::as_u64).unwrap_or(0);
    let duration_ms = span.duration_ms().unwrap_or(0);
    let overlap_pct = if chunk_size > 0 { chunk_overlap as f64 / chunk_size as f64 * 100.0 } else { 0.0 };
    let chunks_per_second = duration_secs(span).filter(|s| *s > 0.0).map(|s| chunks_created as f64 / s).unwrap_or(0.0);

    let mut eval = json!({
        "chunks_created": chunks_created,
        "chunk_size": chunk_size,
        "chunk_overlap": chunk_overlap,
        "overlap_percentage": overlap_pct,
        "chunking_time_ms": duration_ms,
        "chunks_per_second": chunks_per_second,
    });
    if chunk_size < 256 {
        eval["quality_warning"] = json!("chunk size is very small");
    }
    if chunk_size > 2048 {
        eval["quality_warning"] = json!("chunk size is very large");
    }
    if chunk_overlap == 0 && chunk_size >= 512 {
        eval["quality_warning"] = json!("no overlap may cause context loss");
    }
    eval
}

fn evaluate_generic(span: &Span) -> Value {
    json!({
        "span_type": span.span_type,
        "duration_ms": span.duration_ms().unwrap_or(0),
        "cost": span.cost,
        "status": span.status,
        "tokens": span.tokens,
        "model": span.model,
        "provider": span.provider,
    })
}
