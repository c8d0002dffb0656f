//! Node execution contract and process-wide node registry.
//!
//! A "node" is a unit of workflow work keyed by a `node_type` string:
//! `describe_schema`, `validate_config`, `execute`, `estimate_cost`,
//! `emit_stream_event`. Concrete node types are registered with
//! [`NodeRegistry`] and looked up by `node_type` at workflow-build time.

pub mod contract;
pub mod registry;
pub mod schema;
pub mod stream_sink;

pub use contract::{Node, NodeIo, NodeMetadata, StreamEmitter};
pub use registry::{NodeFactory, NodeRegistry};
pub use schema::{ConfigSchema, PropertySchema, SchemaType};
pub use stream_sink::{NullSink, StreamSink};
