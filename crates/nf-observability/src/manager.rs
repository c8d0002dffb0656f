//! Span/trace manager, grounded on
//! `examples/original_source/backend/core/observability.py`'s
//! `ObservabilityManager` (§4.7). Holds every in-flight and recently
//! completed trace for one process, bounded by a default cap of 1000 traces
//! (spec.md §5: "implementers must bound the set (LRU or TTL)").

use std::collections::{HashMap, VecDeque};

use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use nf_domain::{ApiLimits, Span, SpanType, TokenUsage, Trace};

use crate::error::ObservabilityError;

const DEFAULT_MAX_TRACES: usize = 1000;

struct Inner {
    traces: HashMap<Uuid, Trace>,
    /// `span_id -> trace_id`, so a span can be looked up without knowing
    /// its trace.
    span_index: HashMap<Uuid, Uuid>,
    /// Oldest-first trace insertion order, for LRU eviction.
    insertion_order: VecDeque<Uuid>,
}

/// Central manager for traces and spans (§4.7). Cheap to share: every
/// method takes `&self` and locks internally, in the `RwLock<HashMap<..>>`
/// idiom used across this workspace's other manager types.
pub struct ObservabilityManager {
    inner: RwLock<Inner>,
    max_traces: usize,
}

impl Default for ObservabilityManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TRACES)
    }
}

impl ObservabilityManager {
    pub fn new(max_traces: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                traces: HashMap::new(),
                span_index: HashMap::new(),
                insertion_order: VecDeque::new(),
            }),
            max_traces,
        }
    }

    pub fn start_trace(&self, workflow_id: impl Into<String>, execution_id: Uuid, query: Option<String>) -> Uuid {
        let trace = Trace::new(workflow_id, execution_id, query);
        let trace_id = trace.trace_id;

        let mut inner = self.inner.write();
        if inner.traces.len() >= self.max_traces {
            if let Some(evicted) = inner.insertion_order.pop_front() {
                if let Some(old) = inner.traces.remove(&evicted) {
                    inner.span_index.retain(|_, t| *t != old.trace_id);
                    tracing::debug!(trace_id = %evicted, "evicted oldest trace over capacity");
                }
            }
        }
        inner.insertion_order.push_back(trace_id);
        inner.traces.insert(trace_id, trace);

        tracing::info!(%trace_id, %execution_id, "started trace");
        trace_id
    }

    pub fn start_span(
        &self,
        trace_id: Uuid,
        span_type: SpanType,
        parent_span_id: Option<Uuid>,
        inputs: Option<Value>,
    ) -> Result<Uuid, ObservabilityError> {
        let mut inner = self.inner.write();
        let trace = inner
            .traces
            .get_mut(&trace_id)
            .ok_or(ObservabilityError::TraceNotFound(trace_id))?;

        let mut span = Span::new(trace_id, parent_span_id, span_type);
        if let Some(inputs) = inputs {
            span.inputs = inputs;
        }
        span.start().ok();
        let span_id = span.span_id;

        trace.add_span(span)?;
        inner.span_index.insert(span_id, trace_id);

        tracing::debug!(%span_id, %trace_id, ?span_type, "started span");
        Ok(span_id)
    }

    /// Idempotent: a no-op with a warning if `span_id` is unknown or already
    /// terminal (§4.7).
    pub fn complete_span(&self, span_id: Uuid, outputs: Option<Value>, tokens: Option<TokenUsage>, cost: Option<f64>) {
        self.with_span_mut(span_id, |span| {
            if let Some(tokens) = tokens {
                span.tokens = tokens;
            }
            if let Some(cost) = cost {
                span.cost = cost;
            }
            if span.complete(outputs.unwrap_or(Value::Null)).is_err() {
                tracing::warn!(%span_id, "complete_span called on already-terminal span");
            }
        });
    }

    /// If the failing span's type is `llm` or `final_output`, the owning
    /// trace is also marked failed (§4.7).
    pub fn fail_span(&self, span_id: Uuid, error_message: impl Into<String>, error_kind: Option<String>) {
        let error_message = error_message.into();
        let mut inner = self.inner.write();
        let Some(&trace_id) = inner.span_index.get(&span_id) else {
            tracing::warn!(%span_id, "fail_span: span not found");
            return;
        };
        let Some(trace) = inner.traces.get_mut(&trace_id) else {
            return;
        };
        let Some(span) = trace.spans.get_mut(&span_id) else {
            return;
        };

        let span_type = span.span_type;
        if span.fail(error_message.clone(), error_kind).is_err() {
            tracing::warn!(%span_id, "fail_span called on already-terminal span");
            return;
        }
        tracing::warn!(%span_id, %error_message, "span failed");

        if matches!(span_type, SpanType::Llm | SpanType::FinalOutput) {
            let _ = trace.fail();
        }
    }

    pub fn update_span_metadata(
        &self,
        span_id: Uuid,
        tokens: Option<TokenUsage>,
        cost: Option<f64>,
        model: Option<String>,
        provider: Option<String>,
        api_limits: Option<ApiLimits>,
        metadata: Option<HashMap<String, Value>>,
    ) {
        self.with_span_mut(span_id, |span| {
            if let Some(tokens) = tokens {
                span.tokens.input += tokens.input;
                span.tokens.output += tokens.output;
                span.tokens.total += tokens.total;
            }
            if let Some(cost) = cost {
                span.cost = cost;
            }
            if let Some(model) = model {
                span.model = Some(model);
            }
            if let Some(provider) = provider {
                span.provider = Some(provider);
            }
            if let Some(api_limits) = api_limits {
                if api_limits.remaining.is_some() {
                    span.api_limits.remaining = api_limits.remaining;
                }
                if api_limits.limit.is_some() {
                    span.api_limits.limit = api_limits.limit;
                }
                if api_limits.reset_at.is_some() {
                    span.api_limits.reset_at = api_limits.reset_at;
                }
            }
            if let Some(metadata) = metadata {
                span.metadata.extend(metadata);
            }
        });
    }

    pub fn add_span_evaluation(&self, span_id: Uuid, evaluation: Value) {
        self.with_span_mut(span_id, |span| {
            span.evaluation = Some(evaluation);
        });
    }

    /// Fills a span's `cost` from the pricing catalog when its tokens and
    /// model/provider are already set and `cost` is still zero. Returns the
    /// computed cost, or `None` if the catalog has no matching entry.
    pub fn estimate_span_cost(&self, span_id: Uuid, provider: nf_pricing::Provider) -> Option<f64> {
        let (model, prompt_tokens, completion_tokens) = {
            let inner = self.inner.read();
            let trace_id = *inner.span_index.get(&span_id)?;
            let trace = inner.traces.get(&trace_id)?;
            let span = trace.spans.get(&span_id)?;
            (span.model.clone()?, span.tokens.input, span.tokens.output)
        };
        let cost = nf_pricing::estimate_cost(provider, &model, prompt_tokens, completion_tokens)?;
        self.with_span_mut(span_id, |span| span.cost = cost);
        Some(cost)
    }

    pub fn complete_trace(&self, trace_id: Uuid) {
        let mut inner = self.inner.write();
        let Some(trace) = inner.traces.get_mut(&trace_id) else {
            return;
        };
        if trace.complete().is_ok() {
            tracing::info!(
                %trace_id,
                cost = trace.total_cost,
                duration_ms = trace.total_duration_ms,
                spans = trace.spans.len(),
                "completed trace"
            );
        }
    }

    pub fn get_trace(&self, trace_id: Uuid) -> Option<Trace> {
        self.inner.read().traces.get(&trace_id).cloned()
    }

    pub fn get_trace_by_execution_id(&self, execution_id: Uuid) -> Option<Trace> {
        self.inner
            .read()
            .traces
            .values()
            .find(|t| t.execution_id == execution_id)
            .cloned()
    }

    /// Traces sorted newest-first, optionally filtered by `workflow_id`,
    /// capped at `limit`.
    pub fn list_traces(&self, workflow_id: Option<&str>, limit: usize) -> Vec<Trace> {
        let inner = self.inner.read();
        let mut traces: Vec<&Trace> = inner
            .traces
            .values()
            .filter(|t| workflow_id.map_or(true, |w| t.workflow_id == w))
            .collect();
        traces.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        traces.into_iter().take(limit).cloned().collect()
    }

    fn with_span_mut(&self, span_id: Uuid, f: impl FnOnce(&mut Span)) {
        let mut inner = self.inner.write();
        let Some(&trace_id) = inner.span_index.get(&span_id) else {
            tracing::warn!(%span_id, "span not found");
            return;
        };
        if let Some(trace) = inner.traces.get_mut(&trace_id) {
            if let Some(span) = trace.spans.get_mut(&span_id) {
                f(span);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_trace_and_span_round_trips() {
        let mgr = ObservabilityManager::default();
        let trace_id = mgr.start_trace("wf-1", Uuid::new_v4(), Some("hello".into()));
        let span_id = mgr.start_span(trace_id, SpanType::Llm, None, None).unwrap();

        mgr.complete_span(span_id, Some(serde_json::json!({"ok": true})), Some(TokenUsage { input: 10, output: 5, total: 15 }), Some(0.01));
        mgr.complete_trace(trace_id);

        let trace = mgr.get_trace(trace_id).unwrap();
        assert_eq!(trace.total_tokens.total, 15);
        assert!((trace.total_cost - 0.01).abs() < 1e-9);
    }

    #[test]
    fn fail_span_of_llm_type_fails_owning_trace() {
        let mgr = ObservabilityManager::default();
        let trace_id = mgr.start_trace("wf-1", Uuid::new_v4(), None);
        let span_id = mgr.start_span(trace_id, SpanType::Llm, None, None).unwrap();

        mgr.fail_span(span_id, "upstream exploded", Some("TimeoutError".into()));

        let trace = mgr.get_trace(trace_id).unwrap();
        assert_eq!(trace.status, nf_domain::TraceStatus::Failed);
    }

    #[test]
    fn fail_span_of_non_critical_type_leaves_trace_running() {
        let mgr = ObservabilityManager::default();
        let trace_id = mgr.start_trace("wf-1", Uuid::new_v4(), None);
        let span_id = mgr.start_span(trace_id, SpanType::Chunking, None, None).unwrap();

        mgr.fail_span(span_id, "bad chunk size", None);

        let trace = mgr.get_trace(trace_id).unwrap();
        assert_eq!(trace.status, nf_domain::TraceStatus::Running);
    }

    #[test]
    fn complete_span_on_unknown_id_is_a_warned_no_op() {
        let mgr = ObservabilityManager::default();
        mgr.complete_span(Uuid::new_v4(), None, None, None);
    }

    #[test]
    fn start_span_on_unknown_trace_errors() {
        let mgr = ObservabilityManager::default();
        let err = mgr.start_span(Uuid::new_v4(), SpanType::Llm, None, None).unwrap_err();
        assert!(matches!(err, ObservabilityError::TraceNotFound(_)));
    }

    #[test]
    fn eviction_drops_oldest_trace_over_capacity() {
        let mgr = ObservabilityManager::new(2);
        let t1 = mgr.start_trace("wf", Uuid::new_v4(), None);
        let _t2 = mgr.start_trace("wf", Uuid::new_v4(), None);
        let _t3 = mgr.start_trace("wf", Uuid::new_v4(), None);
        assert!(mgr.get_trace(t1).is_none());
    }

    #[test]
    fn list_traces_filters_by_workflow_and_sorts_newest_first() {
        let mgr = ObservabilityManager::default();
        mgr.start_trace("wf-a", Uuid::new_v4(), None);
        let t2 = mgr.start_trace("wf-b", Uuid::new_v4(), None);
        let traces = mgr.list_traces(Some("wf-b"), 10);
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].trace_id, t2);
    }

    #[test]
    fn update_span_metadata_merges_tokens_additively() {
        let mgr = ObservabilityManager::default();
        let trace_id = mgr.start_trace("wf", Uuid::new_v4(), None);
        let span_id = mgr.start_span(trace_id, SpanType::Llm, None, None).unwrap();

        mgr.update_span_metadata(span_id, Some(TokenUsage { input: 5, output: 0, total: 5 }), None, None, None, None, None);
        mgr.update_span_metadata(span_id, Some(TokenUsage { input: 3, output: 2, total: 5 }), None, None, None, None, None);

        let trace = mgr.get_trace(trace_id).unwrap();
        let span = trace.spans.get(&span_id).unwrap();
        assert_eq!(span.tokens.input, 8);
        assert_eq!(span.tokens.total, 10);
    }

    #[test]
    fn estimate_span_cost_uses_pricing_catalog() {
        let mgr = ObservabilityManager::default();
        let trace_id = mgr.start_trace("wf", Uuid::new_v4(), None);
        let span_id = mgr.start_span(trace_id, SpanType::Llm, None, None).unwrap();
        mgr.update_span_metadata(
            span_id,
            Some(TokenUsage { input: 1000, output: 500, total: 1500 }),
            None,
            Some("gpt-4o".into()),
            Some("openai".into()),
            None,
            None,
        );

        let cost = mgr.estimate_span_cost(span_id, nf_pricing::Provider::OpenAi).unwrap();
        assert!(cost > 0.0);
    }
}
