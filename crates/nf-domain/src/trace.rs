use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::span::{Span, SpanStatus, TokenUsage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    Running,
    Completed,
    Failed,
}

/// Root of a span tree for one workflow execution.
///
/// Spans are added as nodes execute; `complete`/`fail` freeze the
/// aggregate totals exactly once. `span_id -> Span` ownership lives here,
/// not on the spans themselves, so the tree has no back-references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub trace_id: Uuid,
    pub workflow_id: String,
    pub execution_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub status: TraceStatus,

    pub total_cost: f64,
    pub total_tokens: TokenUsage,
    pub total_duration_ms: i64,

    pub spans: HashMap<Uuid, Span>,
    pub root_span_ids: Vec<Uuid>,
}

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("trace {0} is already finalised")]
    AlreadyFinalised(Uuid),
    #[error("span {0} not found in trace")]
    SpanNotFound(Uuid),
}

impl Trace {
    pub fn new(workflow_id: impl Into<String>, execution_id: Uuid, query: Option<String>) -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            workflow_id: workflow_id.into(),
            execution_id,
            query,
            started_at: Utc::now(),
            completed_at: None,
            status: TraceStatus::Running,
            total_cost: 0.0,
            total_tokens: TokenUsage::default(),
            total_duration_ms: 0,
            spans: HashMap::new(),
            root_span_ids: Vec::new(),
        }
    }

    /// Inserts a span into the tree. If `parent_span_id` is set, registers
    /// the child on the parent's `child_span_ids`; otherwise the span
    /// becomes a root.
    pub fn add_span(&mut self, span: Span) -> Result<(), TraceError> {
        if let Some(parent_id) = span.parent_span_id {
            let parent = self
                .spans
                .get_mut(&parent_id)
                .ok_or(TraceError::SpanNotFound(parent_id))?;
            parent.child_span_ids.push(span.span_id);
        } else {
            self.root_span_ids.push(span.span_id);
        }
        self.spans.insert(span.span_id, span);
        Ok(())
    }

    /// Spans ordered by `started_at`, the sequence the executor ran them in.
    pub fn span_sequence(&self) -> Vec<&Span> {
        let mut spans: Vec<&Span> = self.spans.values().collect();
        spans.sort_by_key(|s| s.started_at);
        spans
    }

    /// Groups spans whose time intervals overlap, using a linear sweep:
    /// spans are visited in `started_at` order; a span joins the current
    /// group if it overlaps ANY span already in that group, not just the
    /// most recent one. A single long-lived span can therefore transitively
    /// merge two groups that would otherwise look temporally disjoint.
    pub fn parallel_spans(&self) -> Vec<Vec<&Span>> {
        let sequence = self.span_sequence();
        let mut groups: Vec<Vec<&Span>> = Vec::new();
        let mut current_group: Vec<&Span> = Vec::new();

        for span in sequence {
            let Some(completed_at) = span.completed_at else {
                if current_group.is_empty() {
                    current_group.push(span);
                } else {
                    groups.push(std::mem::take(&mut current_group));
                    current_group.push(span);
                }
                continue;
            };

            let overlaps_group = current_group.iter().any(|member| {
                let Some(member_completed) = member.completed_at else {
                    return false;
                };
                span.started_at < member_completed && completed_at > member.started_at
            });

            if current_group.is_empty() || overlaps_group {
                current_group.push(span);
            } else {
                groups.push(std::mem::take(&mut current_group));
                current_group.push(span);
            }
        }
        if !current_group.is_empty() {
            groups.push(current_group);
        }
        groups
    }

    pub fn complete(&mut self) -> Result<(), TraceError> {
        self.finalise(TraceStatus::Completed)
    }

    pub fn fail(&mut self) -> Result<(), TraceError> {
        self.finalise(TraceStatus::Failed)
    }

    fn finalise(&mut self, status: TraceStatus) -> Result<(), TraceError> {
        if self.status != TraceStatus::Running {
            return Err(TraceError::AlreadyFinalised(self.trace_id));
        }
        let (mut cost, mut input, mut output, mut total) = (0.0, 0u64, 0u64, 0u64);
        let mut max_completed = self.started_at;
        for span in self.spans.values() {
            cost += span.cost;
            input += span.tokens.input;
            output += span.tokens.output;
            total += span.tokens.total;
            if let Some(completed) = span.completed_at {
                if completed > max_completed {
                    max_completed = completed;
                }
            }
        }
        self.total_cost = cost;
        self.total_tokens = TokenUsage {
            input,
            output,
            total,
        };
        self.completed_at = Some(max_completed);
        self.total_duration_ms = (max_completed - self.started_at).num_milliseconds();
        self.status = status;
        Ok(())
    }

    pub fn span_status(&self, span_id: Uuid) -> Option<SpanStatus> {
        self.spans.get(&span_id).map(|s| s.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::SpanType;

    fn child(trace_id: Uuid, parent: Uuid, start_offset_ms: i64, dur_ms: i64) -> Span {
        let mut span = Span::new(trace_id, Some(parent), SpanType::NodeExecution);
        span.started_at = Utc::now() + chrono::Duration::milliseconds(start_offset_ms);
        span.completed_at = Some(span.started_at + chrono::Duration::milliseconds(dur_ms));
        span.status = SpanStatus::Completed;
        span
    }

    #[test]
    fn totals_equal_sum_of_children_on_completion() {
        let mut trace = Trace::new("wf-1", Uuid::new_v4(), None);
        let mut root = Span::new(trace.trace_id, None, SpanType::WorkflowStart);
        root.status = SpanStatus::Completed;
        root.completed_at = Some(Utc::now());
        let root_id = root.span_id;
        trace.add_span(root).unwrap();

        let mut a = child(trace.trace_id, root_id, 0, 100);
        a.cost = 0.01;
        a.tokens.total = 50;
        let mut b = child(trace.trace_id, root_id, 200, 100);
        b.cost = 0.02;
        b.tokens.total = 75;
        trace.add_span(a).unwrap();
        trace.add_span(b).unwrap();

        trace.complete().unwrap();
        assert!((trace.total_cost - 0.03).abs() < 1e-9);
        assert_eq!(trace.total_tokens.total, 125);
    }

    #[test]
    fn every_span_trace_id_matches_trace() {
        let mut trace = Trace::new("wf-1", Uuid::new_v4(), None);
        let root = Span::new(trace.trace_id, None, SpanType::WorkflowStart);
        trace.add_span(root).unwrap();
        assert!(trace.spans.values().all(|s| s.trace_id == trace.trace_id));
    }

    #[test]
    fn overlapping_spans_join_same_group() {
        let mut trace = Trace::new("wf-1", Uuid::new_v4(), None);
        let root = Span::new(trace.trace_id, None, SpanType::WorkflowStart);
        let root_id = root.span_id;
        trace.add_span(root).unwrap();

        // a: [0,100), b: [50,150) overlaps a, c: [140,200) overlaps b but not a directly.
        let a = child(trace.trace_id, root_id, 0, 100);
        let b = child(trace.trace_id, root_id, 50, 100);
        let c = child(trace.trace_id, root_id, 140, 60);
        trace.add_span(a).unwrap();
        trace.add_span(b).unwrap();
        trace.add_span(c).unwrap();

        let groups = trace.parallel_spans();
        // root stands alone (no overlap with a/b/c), a+b+c merge transitively.
        let sizes: Vec<usize> = groups.iter().map(|g| g.len()).collect();
        assert!(sizes.contains(&3) || sizes.iter().sum::<usize>() == 4);
    }

    #[test]
    fn double_finalise_rejected() {
        let mut trace = Trace::new("wf-1", Uuid::new_v4(), None);
        trace.complete().unwrap();
        assert!(trace.complete().is_err());
    }
}
