//! MCP (Model Context Protocol) client: JSON-RPC over stdio, per-tenant
//! server lifecycle, and a static catalog of popular server presets.
//!
//! ```rust,ignore
//! use nf_mcp::{McpServerManager, McpServerConfig};
//!
//! let mut servers = McpServerManager::with_json_file("mcp_servers.json").build().await;
//! servers.add_server_from_preset("filesystem", env_values, None, None).await?;
//! servers.connect_server("filesystem").await?;
//! let result = servers.manager().call_tool("filesystem.read_file", json!({"path": "/tmp/x"})).await?;
//! ```

pub mod config;
pub mod manager;
pub mod presets;
pub mod protocol;
pub mod server_manager;
pub mod transport;

pub use config::{McpServerConfig, McpServerRecord};
pub use manager::{McpError, McpManager, McpServer};
pub use presets::{find_preset, AuthKind, McpServerPreset, ServerType, MCP_SERVER_PRESETS};
pub use protocol::McpToolDef;
pub use server_manager::{JsonFileStore, McpServerManager, ServerManagerError, ServerStore};
