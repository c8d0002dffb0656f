//! Adapter-wrapped tools (`to_adapter_tools`): the `ToolDefinition` shape an
//! LLM provider adapter sees, plus an executor that dispatches a call back
//! through either the MCP manager or the node registry — the integration
//! point between agents and nodes (§4.4), grounded on
//! `examples/original_source/backend/core/mcp/tool_registry.py`'s
//! `CrewAIMCPTool._run`/`_execute_internal_node`.

use nf_domain::{Error, ToolDefinition};
use nf_mcp::McpManager;
use nf_nodes::NodeRegistry;
use serde_json::Value;

use crate::registry::{ToolRegistry, ToolSource};

/// Converts registered tools into the provider-facing `ToolDefinition`
/// shape. `names`, if given, restricts the set; `None` returns every
/// registered tool.
pub fn to_adapter_tools(registry: &ToolRegistry, names: Option<&[String]>) -> Vec<ToolDefinition> {
    let defs = match names {
        Some(names) => names
            .iter()
            .filter_map(|n| registry.get(n))
            .collect::<Vec<_>>(),
        None => registry.get_all(),
    };
    defs.into_iter()
        .map(|t| ToolDefinition {
            name: t.name.clone(),
            description: t.description.clone(),
            parameters: t.input_schema.clone(),
        })
        .collect()
}

/// Dispatches a call to an adapter-wrapped tool through the collaborator
/// that actually implements it.
pub struct ToolExecutor<'a> {
    pub registry: &'a ToolRegistry,
    pub mcp: &'a McpManager,
    pub nodes: &'a NodeRegistry,
}

impl<'a> ToolExecutor<'a> {
    pub fn new(registry: &'a ToolRegistry, mcp: &'a McpManager, nodes: &'a NodeRegistry) -> Self {
        Self { registry, mcp, nodes }
    }

    /// Calls `name` with `arguments`. For internal tools, `llm_config` (the
    /// caller's LLM configuration) is propagated into the node's `config`
    /// under `_llm`, per §4.4 ("the integration point between agents and
    /// nodes").
    pub async fn call(&self, name: &str, arguments: Value, llm_config: Option<Value>) -> Result<Value, Error> {
        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| Error::Other(format!("tool '{name}' not registered")))?;

        match tool.source {
            ToolSource::Mcp => {
                let result = self.mcp.call_tool(name, arguments).await.map_err(Error::from)?;
                let text = result
                    .content
                    .into_iter()
                    .map(|c| c.text)
                    .collect::<Vec<_>>()
                    .join("\n");
                if result.is_error {
                    Err(Error::McpCallFailed(text))
                } else {
                    Ok(Value::String(text))
                }
            }
            ToolSource::Internal => {
                let node_type = tool
                    .node_type
                    .as_deref()
                    .ok_or_else(|| Error::Other(format!("internal tool '{name}' has no node_type")))?;
                let node = self.nodes.get(node_type)?;

                let inputs = arguments
                    .as_object()
                    .cloned()
                    .unwrap_or_default();
                let mut config = serde_json::Map::new();
                if let Some(llm_config) = llm_config {
                    config.insert("_llm".to_string(), llm_config);
                }

                let outputs = node.execute_safe(&inputs, &config).await?;
                Ok(Value::Object(outputs))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ToolRegistry;
    use async_trait::async_trait;
    use nf_nodes::{ConfigSchema, Node, NodeIo, NodeMetadata};
    use std::sync::Arc;

    struct EchoNode;

    #[async_trait]
    impl Node for EchoNode {
        fn node_type(&self) -> &str {
            "echo_node"
        }
        fn metadata(&self) -> NodeMetadata {
            NodeMetadata {
                node_type: "echo_node".into(),
                name: "Echo".into(),
                description: String::new(),
                category: "test".into(),
            }
        }
        fn describe_schema(&self) -> ConfigSchema {
            ConfigSchema::default()
        }
        async fn execute(&self, inputs: &NodeIo, _config: &NodeIo) -> Result<NodeIo, Error> {
            Ok(inputs.clone())
        }
    }

    #[tokio::test]
    async fn call_dispatches_internal_tool_through_node_registry() {
        let mut registry = ToolRegistry::new();
        registry.register_internal_tool("echo_tool", "echoes", serde_json::json!({}), "echo_node", "test");

        let mut nodes = NodeRegistry::new();
        nodes.register(
            "echo_node",
            Arc::new(|| Box::new(EchoNode) as Box<dyn Node>),
            NodeMetadata {
                node_type: "echo_node".into(),
                name: "Echo".into(),
                description: String::new(),
                category: "test".into(),
            },
        );
        let mcp = McpManager::empty();

        let executor = ToolExecutor::new(&registry, &mcp, &nodes);
        let result = executor
            .call("echo_tool", serde_json::json!({"x": 1}), None)
            .await
            .unwrap();
        assert_eq!(result, serde_json::json!({"x": 1}));
    }

    #[tokio::test]
    async fn call_unknown_tool_fails() {
        let registry = ToolRegistry::new();
        let nodes = NodeRegistry::new();
        let mcp = McpManager::empty();
        let executor = ToolExecutor::new(&registry, &mcp, &nodes);
        let err = executor.call("nonexistent", serde_json::json!({}), None).await;
        assert!(err.is_err());
    }

    #[test]
    fn to_adapter_tools_returns_all_by_default() {
        let mut reg = ToolRegistry::new();
        reg.register_internal_tool("score_lead", "scores", serde_json::json!({}), "lead_scorer", "sales");
        let defs = to_adapter_tools(&reg, None);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "score_lead");
    }

    #[test]
    fn to_adapter_tools_filters_by_names() {
        let mut reg = ToolRegistry::new();
        reg.register_internal_tool("score_lead", "scores", serde_json::json!({}), "lead_scorer", "sales");
        reg.register_internal_tool("generate_blog_post", "writes", serde_json::json!({}), "blog_generator", "content");
        let defs = to_adapter_tools(&reg, Some(&["score_lead".to_string()]));
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "score_lead");
    }

    #[test]
    fn to_adapter_tools_skips_unknown_names() {
        let reg = ToolRegistry::new();
        let defs = to_adapter_tools(&reg, Some(&["nonexistent".to_string()]));
        assert!(defs.is_empty());
    }
}
