//! Unified tool catalog spanning MCP server tools and internal nodes
//! exposed as tools (§4.4), grounded on
//! `examples/original_source/backend/core/mcp/tool_registry.py`'s
//! `MCPToolRegistry`.

use std::collections::HashMap;

use serde_json::Value;

/// Where a registered tool's implementation lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSource {
    Mcp,
    Internal,
}

/// A tool definition, unified regardless of source.
#[derive(Debug, Clone)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub source: ToolSource,
    /// Set for MCP tools: the server the bare tool name lives on.
    pub server_name: Option<String>,
    /// Set for internal tools: the node type backing this tool.
    pub node_type: Option<String>,
    pub category: String,
}

/// Central catalog of every tool an agent may call, keyed by fully
/// qualified name (`"{server_name}.{tool_name}"` for MCP tools, bare name
/// for internal tools).
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolDef>,
    internal_nodes_registered: bool,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_mcp_tool(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        server_name: impl Into<String>,
        category: impl Into<String>,
    ) {
        let name = name.into();
        let server_name = server_name.into();
        let full_name = format!("{server_name}.{name}");
        tracing::debug!(tool = %full_name, "registered MCP tool");
        self.tools.insert(
            full_name.clone(),
            ToolDef {
                name: full_name,
                description: description.into(),
                input_schema,
                source: ToolSource::Mcp,
                server_name: Some(server_name),
                node_type: None,
                category: category.into(),
            },
        );
    }

    pub fn register_internal_tool(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        node_type: impl Into<String>,
        category: impl Into<String>,
    ) {
        let name = name.into();
        tracing::debug!(tool = %name, "registered internal tool");
        self.tools.insert(
            name.clone(),
            ToolDef {
                name,
                description: description.into(),
                input_schema,
                source: ToolSource::Internal,
                server_name: None,
                node_type: Some(node_type.into()),
                category: category.into(),
            },
        );
    }

    /// Idempotent bulk registration of the curated internal AI-native tool
    /// set. Must run exactly once; later calls are a no-op.
    pub fn register_internal_nodes_as_tools(&mut self) {
        if self.internal_nodes_registered {
            return;
        }
        for def in crate::curated::CURATED_INTERNAL_TOOLS {
            self.register_internal_tool(
                def.name,
                def.description,
                (def.schema)(),
                def.node_type,
                def.category,
            );
        }
        self.internal_nodes_registered = true;
        tracing::info!(
            count = crate::curated::CURATED_INTERNAL_TOOLS.len(),
            "registered curated internal tools"
        );
    }

    pub fn get(&self, name: &str) -> Option<&ToolDef> {
        self.tools.get(name)
    }

    pub fn get_by_category(&self, category: &str) -> Vec<&ToolDef> {
        let mut result: Vec<&ToolDef> = self.tools.values().filter(|t| t.category == category).collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }

    pub fn get_by_source(&self, source: ToolSource) -> Vec<&ToolDef> {
        let mut result: Vec<&ToolDef> = self.tools.values().filter(|t| t.source == source).collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }

    pub fn get_all(&self) -> Vec<&ToolDef> {
        let mut result: Vec<&ToolDef> = self.tools.values().collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }
}
