//! MCP manager — holds one server connection per configured name and
//! mediates tool discovery and dispatch. One `McpManager` instance per
//! tenant; nothing here is a process-wide singleton.

use std::collections::HashMap;

use serde_json::Value;

use crate::config::McpServerConfig;
use crate::protocol::{self, McpToolDef, ToolCallResult, ToolsListResult};
use crate::transport::{McpTransport, StdioTransport, TransportError};

/// An MCP server connection (one per configured server).
pub struct McpServer {
    pub name: String,
    /// Tools discovered via `tools/list`, already keyed `"{name}.{tool}"`.
    pub tools: Vec<McpToolDef>,
    transport: Box<dyn McpTransport>,
}

impl McpServer {
    /// Run the full connection protocol: spawn, `initialize`,
    /// `notifications/initialized`, `tools/list`.
    pub async fn connect(config: &McpServerConfig) -> Result<Self, McpError> {
        let transport = StdioTransport::spawn(config).await.map_err(|e| match e {
            TransportError::SetupFailed { stderr } => McpError::SetupFailed(stderr),
            other => McpError::SetupFailed(other.to_string()),
        })?;

        let init_params = protocol::initialize_params();
        let params_value = serde_json::to_value(&init_params)
            .map_err(|e| McpError::Protocol(format!("failed to serialize initialize params: {e}")))?;

        let resp = transport
            .send_request("initialize", Some(params_value))
            .await
            .map_err(Self::classify_connection_error)?;

        if resp.is_error() {
            let err = resp.error.unwrap();
            return Err(McpError::ConnectionFailed(format!("initialize failed: {err}")));
        }

        tracing::debug!(server = %config.name, "MCP initialize response received");

        transport
            .send_notification("notifications/initialized")
            .await
            .map_err(Self::classify_connection_error)?;

        tracing::debug!(server = %config.name, "sent notifications/initialized");

        let tools_resp = transport
            .send_request("tools/list", None)
            .await
            .map_err(Self::classify_connection_error)?;

        let tools = if tools_resp.is_error() {
            tracing::warn!(server = %config.name, "tools/list returned error, server will have no tools");
            Vec::new()
        } else {
            let result_value = tools_resp.result.unwrap_or(Value::Null);
            match serde_json::from_value::<ToolsListResult>(result_value) {
                Ok(r) => r.tools,
                Err(e) => {
                    tracing::warn!(server = %config.name, error = %e, "failed to parse tools/list result");
                    Vec::new()
                }
            }
        };

        tracing::info!(server = %config.name, tool_count = tools.len(), "MCP server connected");

        Ok(Self {
            name: config.name.clone(),
            tools,
            transport: Box::new(transport),
        })
    }

    fn classify_connection_error(e: TransportError) -> McpError {
        match e {
            TransportError::SetupFailed { stderr } => McpError::SetupFailed(stderr),
            TransportError::ConnectionFailed(stderr) => McpError::ConnectionFailed(stderr),
            other => McpError::ConnectionFailed(other.to_string()),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.transport.is_alive()
    }

    /// `qualified_or_bare_tool_name` is resolved by the caller (`McpManager`)
    /// before this is invoked — this method always calls the underlying
    /// server by its bare tool name.
    pub async fn call_tool(&self, tool_name: &str, arguments: Value) -> Result<ToolCallResult, McpError> {
        if !self.transport.is_alive() {
            return Err(McpError::ServerDown(self.name.clone()));
        }

        let params = serde_json::json!({ "name": tool_name, "arguments": arguments });
        let resp = self
            .transport
            .send_request("tools/call", Some(params))
            .await
            .map_err(Self::classify_connection_error)?;

        if resp.is_error() {
            let err = resp.error.unwrap();
            return Err(McpError::CallFailed(format!("tools/call failed: {err}")));
        }

        let result_value = resp.result.unwrap_or(Value::Null);
        serde_json::from_value::<ToolCallResult>(result_value)
            .map_err(|e| McpError::CallFailed(format!("failed to parse tools/call result: {e}")))
    }

    pub async fn shutdown(&self) {
        tracing::info!(server = %self.name, "shutting down MCP server");
        self.transport.shutdown().await;
    }
}

/// Holds every connected server for one tenant. Calls across servers are
/// concurrent; calls to the same server are serialised by that server's
/// transport.
#[derive(Default)]
pub struct McpManager {
    servers: HashMap<String, McpServer>,
}

impl McpManager {
    pub fn empty() -> Self {
        Self {
            servers: HashMap::new(),
        }
    }

    /// Connect one server and register it under its config name. Replaces
    /// any previous connection under the same name (the old one is not
    /// shut down here — callers that reconnect must `disconnect` first).
    pub async fn add_server(&mut self, config: &McpServerConfig) -> Result<usize, McpError> {
        let server = McpServer::connect(config).await?;
        let tool_count = server.tools.len();
        self.servers.insert(config.name.clone(), server);
        Ok(tool_count)
    }

    pub async fn disconnect_server(&mut self, name: &str) {
        if let Some(server) = self.servers.remove(name) {
            server.shutdown().await;
        }
    }

    /// All discovered tools across alive servers, as `(server_name, tool)`.
    pub fn list_tools(&self) -> Vec<(&str, &McpToolDef)> {
        self.servers
            .values()
            .filter(|s| s.is_alive())
            .flat_map(|server| server.tools.iter().map(move |tool| (server.name.as_str(), tool)))
            .collect()
    }

    /// Resolves `name` to a `(server, tool)` pair. Accepts a fully qualified
    /// `"server.tool"` name, or a bare tool name if it is unambiguous across
    /// connected servers.
    pub fn resolve_tool(&self, name: &str) -> Result<(&str, &str), McpError> {
        if let Some((server, tool)) = name.split_once('.') {
            if self.servers.contains_key(server) {
                return Ok((server, tool));
            }
        }

        let candidates: Vec<&str> = self
            .servers
            .values()
            .filter(|s| s.is_alive())
            .filter(|s| s.tools.iter().any(|t| t.name == name))
            .map(|s| s.name.as_str())
            .collect();

        match candidates.as_slice() {
            [] => Err(McpError::ToolNotFound(name.to_string())),
            [only] => Ok((only, name)),
            many => Err(McpError::AmbiguousTool {
                name: name.to_string(),
                candidates: many.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }

    /// Calls a tool by fully qualified or bare name (see `resolve_tool`).
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallResult, McpError> {
        let (server_name, tool_name) = self.resolve_tool(name)?;
        let tool_name = tool_name.to_string();
        let server = self
            .servers
            .get(server_name)
            .ok_or_else(|| McpError::ServerNotFound(server_name.to_string()))?;
        server.call_tool(&tool_name, arguments).await
    }

    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    pub fn tool_count(&self) -> usize {
        self.servers.values().filter(|s| s.is_alive()).map(|s| s.tools.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Shut down every server concurrently.
    pub async fn shutdown_all(&mut self) {
        let futs: Vec<_> = self.servers.values().map(|s| s.shutdown()).collect();
        futures_util::future::join_all(futs).await;
        self.servers.clear();
    }
}

#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("MCP server setup failed: {0}")]
    SetupFailed(String),

    #[error("MCP connection failed: {0}")]
    ConnectionFailed(String),

    #[error("MCP protocol error: {0}")]
    Protocol(String),

    #[error("MCP tool call failed: {0}")]
    CallFailed(String),

    #[error("MCP server not found: {0}")]
    ServerNotFound(String),

    #[error("MCP server is down: {0}")]
    ServerDown(String),

    #[error("MCP tool not found: {0}")]
    ToolNotFound(String),

    #[error("ambiguous tool name '{name}', candidates: {candidates:?}")]
    AmbiguousTool { name: String, candidates: Vec<String> },
}

impl From<McpError> for nf_domain::Error {
    fn from(e: McpError) -> Self {
        match e {
            McpError::SetupFailed(s) => nf_domain::Error::McpSetupFailed(s),
            McpError::ConnectionFailed(s) => nf_domain::Error::McpConnectionFailed(s),
            McpError::CallFailed(s) => nf_domain::Error::McpCallFailed(s),
            other => nf_domain::Error::Other(other.to_string()),
        }
    }
}
