//! Unified tool catalog: MCP server tools keyed `"{server_name}.{tool_name}"`
//! and internal nodes exposed as tools keyed by bare name (§4.4).

pub mod adapter;
pub mod curated;
pub mod registry;

pub use adapter::{to_adapter_tools, ToolExecutor};
pub use registry::{ToolDef, ToolRegistry, ToolSource};
