//! Shared data model and error taxonomy for the workflow engine.
//!
//! Every other `nf-*` crate depends on this one for the vocabulary it uses
//! to describe nodes, tool calls, streaming, and execution traces.

pub mod error;
pub mod span;
pub mod stream;
pub mod tool;
pub mod trace;

pub use error::{Error, Result};
pub use span::{ApiLimits, Span, SpanStatus, SpanTerminalError, SpanType, TokenUsage};
pub use stream::{StreamEvent, StreamEventKind};
pub use tool::ToolDefinition;
pub use trace::{Trace, TraceError, TraceStatus};
