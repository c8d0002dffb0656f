use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Closed set of span kinds. Not exhaustive of every future node type, but
/// every kind an executor or node in this workspace can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanType {
    WorkflowStart,
    NodeExecution,
    Llm,
    Embedding,
    VectorSearch,
    Reranking,
    Chunking,
    QueryInput,
    FinalOutput,
    AgentToolCall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl SpanStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SpanStatus::Completed | SpanStatus::Failed | SpanStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub total: u64,
}

/// Rate-limit headers observed on the span's underlying API call, if any.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiLimits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<DateTime<Utc>>,
}

/// One atomic operation within a trace.
///
/// Transitions only `pending -> running -> {completed|failed|cancelled}`;
/// once terminal, further mutation through the `complete`/`fail`/`cancel`
/// methods is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub span_id: Uuid,
    pub trace_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<Uuid>,

    pub span_type: SpanType,
    pub status: SpanStatus,

    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    pub inputs: serde_json::Value,
    pub outputs: serde_json::Value,

    pub tokens: TokenUsage,
    pub cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_stack: Option<String>,

    pub api_limits: ApiLimits,
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<serde_json::Value>,

    pub metadata: HashMap<String, serde_json::Value>,

    pub child_span_ids: Vec<Uuid>,
}

/// Error returned when a caller tries to mutate a span that has already
/// reached a terminal status.
#[derive(Debug, thiserror::Error)]
#[error("span {span_id} is already terminal ({status:?})")]
pub struct SpanTerminalError {
    pub span_id: Uuid,
    pub status: SpanStatus,
}

impl Span {
    pub fn new(trace_id: Uuid, parent_span_id: Option<Uuid>, span_type: SpanType) -> Self {
        Self {
            span_id: Uuid::new_v4(),
            trace_id,
            parent_span_id,
            span_type,
            status: SpanStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
            inputs: serde_json::Value::Null,
            outputs: serde_json::Value::Null,
            tokens: TokenUsage::default(),
            cost: 0.0,
            model: None,
            provider: None,
            error_message: None,
            error_kind: None,
            error_stack: None,
            api_limits: ApiLimits::default(),
            retry_count: 0,
            timeout: None,
            evaluation: None,
            metadata: HashMap::new(),
            child_span_ids: Vec::new(),
        }
    }

    /// `pending -> running`. A no-op if already running.
    pub fn start(&mut self) -> Result<(), SpanTerminalError> {
        if self.status.is_terminal() {
            return Err(SpanTerminalError {
                span_id: self.span_id,
                status: self.status,
            });
        }
        self.status = SpanStatus::Running;
        Ok(())
    }

    pub fn complete(&mut self, outputs: serde_json::Value) -> Result<(), SpanTerminalError> {
        self.finish(SpanStatus::Completed, |s| {
            s.outputs = outputs;
        })
    }

    pub fn fail(
        &mut self,
        error_message: impl Into<String>,
        error_kind: Option<String>,
    ) -> Result<(), SpanTerminalError> {
        self.finish(SpanStatus::Failed, |s| {
            s.error_message = Some(error_message.into());
            s.error_kind = error_kind;
        })
    }

    pub fn cancel(&mut self) -> Result<(), SpanTerminalError> {
        self.finish(SpanStatus::Cancelled, |_| {})
    }

    fn finish(
        &mut self,
        status: SpanStatus,
        apply: impl FnOnce(&mut Self),
    ) -> Result<(), SpanTerminalError> {
        if self.status.is_terminal() {
            return Err(SpanTerminalError {
                span_id: self.span_id,
                status: self.status,
            });
        }
        apply(self);
        self.status = status;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.completed_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_span_is_pending() {
        let span = Span::new(Uuid::new_v4(), None, SpanType::Llm);
        assert_eq!(span.status, SpanStatus::Pending);
        assert!(span.completed_at.is_none());
    }

    #[test]
    fn complete_sets_terminal_and_duration() {
        let mut span = Span::new(Uuid::new_v4(), None, SpanType::Llm);
        span.start().unwrap();
        span.complete(serde_json::json!({"ok": true})).unwrap();
        assert_eq!(span.status, SpanStatus::Completed);
        assert!(span.duration_ms().unwrap() >= 0);
    }

    #[test]
    fn mutation_after_terminal_rejected() {
        let mut span = Span::new(Uuid::new_v4(), None, SpanType::Llm);
        span.start().unwrap();
        span.complete(serde_json::Value::Null).unwrap();
        let err = span.fail("too late", None).unwrap_err();
        assert_eq!(err.span_id, span.span_id);
    }

    #[test]
    fn cancelled_is_terminal() {
        let mut span = Span::new(Uuid::new_v4(), None, SpanType::NodeExecution);
        span.start().unwrap();
        span.cancel().unwrap();
        assert!(span.status.is_terminal());
        assert!(span.complete(serde_json::Value::Null).is_err());
    }
}
