//! Span/trace aggregation, backend adapter fan-out, and span evaluation
//! (§4.7–4.9): the layer between node execution and cost forecasting.

pub mod adapters;
pub mod error;
pub mod evaluator;
pub mod manager;

pub use adapters::{AdapterFanout, GenerationOrientedSink, ObservabilityAdapter, ObservationRecord, RunOrientedSink, RunRecord};
pub use error::ObservabilityError;
pub use evaluator::evaluate_span;
pub use manager::ObservabilityManager;

pub use nf_domain::{ApiLimits, Span, SpanStatus, SpanType, TokenUsage, Trace, TraceStatus};
