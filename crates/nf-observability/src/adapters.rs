//! Backend adapter fan-out (§4.8). An adapter set, discovered at
//! construction, is notified at each trace/span lifecycle point; adapter
//! failures are caught, logged, and never propagate to the caller.
//!
//! Two concrete shapes are supported, grounded on
//! `examples/original_source/backend/core/observability_langsmith.py`
//! (run-oriented: trace = parent run, span = type-mapped child run) and
//! `observability_langfuse.py` (generation-oriented: `llm`/`embedding`
//! spans become "generation" observations, everything else a generic
//! span). No concrete LangSmith/LangFuse HTTP client is implemented here —
//! that would require a dependency absent from the whole example pack — so
//! each shape ships as an in-memory sink an embedder can point at their own
//! backend, or use directly in tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use nf_domain::{Span, SpanType, Trace};

/// One observability backend. Implementors talk to an external platform;
/// failures are local to the call and must not panic the fan-out.
#[async_trait]
pub trait ObservabilityAdapter: Send + Sync {
    async fn start_trace(&self, trace: &Trace) -> anyhow::Result<()>;
    async fn log_span(&self, trace_id: Uuid, span: &Span) -> anyhow::Result<()>;
    async fn complete_trace(&self, trace: &Trace) -> anyhow::Result<()>;
}

/// Notifies every configured adapter at each lifecycle point, catching and
/// logging individual adapter failures rather than propagating them
/// (§4.8: "adapter exceptions are caught, logged, and do not propagate").
#[derive(Clone, Default)]
pub struct AdapterFanout {
    adapters: Vec<Arc<dyn ObservabilityAdapter>>,
}

impl AdapterFanout {
    pub fn new(adapters: Vec<Arc<dyn ObservabilityAdapter>>) -> Self {
        Self { adapters }
    }

    pub async fn start_trace(&self, trace: &Trace) {
        for adapter in &self.adapters {
            if let Err(e) = adapter.start_trace(trace).await {
                tracing::warn!(error = %e, "observability adapter failed to start trace");
            }
        }
    }

    pub async fn log_span(&self, trace_id: Uuid, span: &Span) {
        for adapter in &self.adapters {
            if let Err(e) = adapter.log_span(trace_id, span).await {
                tracing::warn!(error = %e, "observability adapter failed to log span");
            }
        }
    }

    pub async fn complete_trace(&self, trace: &Trace) {
        for adapter in &self.adapters {
            if let Err(e) = adapter.complete_trace(trace).await {
                tracing::warn!(error = %e, "observability adapter failed to complete trace");
            }
        }
    }
}

fn run_type_for(span_type: SpanType) -> &'static str {
    match span_type {
        SpanType::Embedding => "embedding",
        SpanType::Llm => "llm",
        SpanType::VectorSearch => "retriever",
        SpanType::Reranking => "reranker",
        SpanType::Chunking => "transformer",
        SpanType::QueryInput => "input",
        SpanType::FinalOutput => "output",
        _ => "tool",
    }
}

/// One recorded run, run-oriented shape (LangSmith).
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub run_type: &'static str,
    pub trace_id: Uuid,
    pub span_id: Option<Uuid>,
    pub inputs: serde_json::Value,
    pub outputs: serde_json::Value,
    pub error: Option<String>,
}

/// Run-oriented sink: a trace opens a parent run, each span a child run
/// whose run type is mapped from its span type.
#[derive(Default)]
pub struct RunOrientedSink {
    runs: Mutex<Vec<RunRecord>>,
}

impl RunOrientedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runs(&self) -> Vec<RunRecord> {
        self.runs.lock().clone()
    }
}

#[async_trait]
impl ObservabilityAdapter for RunOrientedSink {
    async fn start_trace(&self, trace: &Trace) -> anyhow::Result<()> {
        self.runs.lock().push(RunRecord {
            run_type: "chain",
            trace_id: trace.trace_id,
            span_id: None,
            inputs: serde_json::json!({ "query": trace.query, "workflow_id": trace.workflow_id }),
            outputs: serde_json::Value::Null,
            error: None,
        });
        Ok(())
    }

    async fn log_span(&self, trace_id: Uuid, span: &Span) -> anyhow::Result<()> {
        self.runs.lock().push(RunRecord {
            run_type: run_type_for(span.span_type),
            trace_id,
            span_id: Some(span.span_id),
            inputs: span.inputs.clone(),
            outputs: span.outputs.clone(),
            error: span.error_message.clone(),
        });
        Ok(())
    }

    async fn complete_trace(&self, trace: &Trace) -> anyhow::Result<()> {
        let mut runs = self.runs.lock();
        if let Some(root) = runs.iter_mut().find(|r| r.trace_id == trace.trace_id && r.span_id.is_none()) {
            root.outputs = serde_json::json!({
                "total_cost": trace.total_cost,
                "total_tokens": trace.total_tokens.total,
                "total_duration_ms": trace.total_duration_ms,
            });
        }
        Ok(())
    }
}

/// One recorded observation, generation-oriented shape (LangFuse).
#[derive(Debug, Clone)]
pub enum ObservationRecord {
    Generation {
        trace_id: Uuid,
        span_id: Uuid,
        model: String,
        input_tokens: u64,
        output_tokens: u64,
        cost: f64,
    },
    Span {
        trace_id: Uuid,
        span_id: Uuid,
        span_type: SpanType,
    },
}

/// Generation-oriented sink: `llm`/`embedding` spans become `Generation`
/// observations carrying model/usage; every other span type is a generic
/// `Span` observation.
#[derive(Default)]
pub struct GenerationOrientedSink {
    observations: Mutex<Vec<ObservationRecord>>,
}

impl GenerationOrientedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observations(&self) -> Vec<ObservationRecord> {
        self.observations.lock().clone()
    }
}

#[async_trait]
impl ObservabilityAdapter for GenerationOrientedSink {
    async fn start_trace(&self, _trace: &Trace) -> anyhow::Result<()> {
        Ok(())
    }

    async fn log_span(&self, trace_id: Uuid, span: &Span) -> anyhow::Result<()> {
        let record = if matches!(span.span_type, SpanType::Llm | SpanType::Embedding) {
            ObservationRecord::Generation {
                trace_id,
                span_id: span.span_id,
                model: span.model.clone().unwrap_or_else(|| "unknown".into()),
                input_tokens: span.tokens.input,
                output_tokens: span.tokens.output,
                cost: span.cost,
            }
        } else {
            ObservationRecord::Span {
                trace_id,
                span_id: span.span_id,
                span_type: span.span_type,
            }
        };
        self.observations.lock().push(record);
        Ok(())
    }

    async fn complete_trace(&self, _trace: &Trace) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_trace() -> Trace {
        Trace::new("wf-1", Uuid::new_v4(), Some("q".into()))
    }

    #[tokio::test]
    async fn run_oriented_sink_maps_span_types_to_run_types() {
        let sink = Arc::new(RunOrientedSink::new());
        let fanout = AdapterFanout::new(vec![sink.clone()]);
        let trace = sample_trace();
        fanout.start_trace(&trace).await;

        let span = Span::new(trace.trace_id, None, SpanType::VectorSearch);
        fanout.log_span(trace.trace_id, &span).await;

        let runs = sink.runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1].run_type, "retriever");
    }

    #[tokio::test]
    async fn generation_oriented_sink_splits_llm_from_generic() {
        let sink = Arc::new(GenerationOrientedSink::new());
        let fanout = AdapterFanout::new(vec![sink.clone()]);
        let trace = sample_trace();

        let mut llm_span = Span::new(trace.trace_id, None, SpanType::Llm);
        llm_span.model = Some("gpt-4o".into());
        fanout.log_span(trace.trace_id, &llm_span).await;

        let chunk_span = Span::new(trace.trace_id, None, SpanType::Chunking);
        fanout.log_span(trace.trace_id, &chunk_span).await;

        let observations = sink.observations();
        assert!(matches!(observations[0], ObservationRecord::Generation { .. }));
        assert!(matches!(observations[1], ObservationRecord::Span { .. }));
    }

    #[tokio::test]
    async fn fanout_to_multiple_adapters_is_independent() {
        let run_sink = Arc::new(RunOrientedSink::new());
        let gen_sink = Arc::new(GenerationOrientedSink::new());
        let fanout = AdapterFanout::new(vec![run_sink.clone(), gen_sink.clone()]);
        let trace = sample_trace();
        fanout.start_trace(&trace).await;

        let span = Span::new(trace.trace_id, None, SpanType::Llm);
        fanout.log_span(trace.trace_id, &span).await;

        assert_eq!(run_sink.runs().len(), 2);
        assert_eq!(gen_sink.observations().len(), 1);
    }
}
