//! MCP server configuration and the persistent server record.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configuration used to spawn and connect to one MCP server subprocess.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerConfig {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Persistent, user-facing configuration of one MCP server for one tenant.
///
/// One record per (tenant, name). `connected` and `tools_count` are
/// transient — they reflect the live client state, not durable config, and
/// are refreshed on connect/disconnect rather than loaded from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(skip)]
    pub connected: bool,
    #[serde(default)]
    pub tools_count: usize,
}

fn default_true() -> bool {
    true
}

impl McpServerRecord {
    pub fn to_config(&self) -> McpServerConfig {
        McpServerConfig {
            name: self.name.clone(),
            command: self.command.clone(),
            args: self.args.clone(),
            env: self.env.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_defaults_enabled_and_disconnected() {
        let raw = r#"{
            "name": "filesystem",
            "display_name": "Filesystem",
            "command": "npx",
            "args": ["-y", "@modelcontextprotocol/server-filesystem", "/tmp"]
        }"#;
        let record: McpServerRecord = serde_json::from_str(raw).unwrap();
        assert!(record.enabled);
        assert!(!record.connected);
        assert_eq!(record.tools_count, 0);
    }

    #[test]
    fn to_config_carries_command_and_env() {
        let mut env = HashMap::new();
        env.insert("TOKEN".to_string(), "secret".to_string());
        let record = McpServerRecord {
            name: "slack".into(),
            preset: Some("slack".into()),
            display_name: "Slack".into(),
            description: String::new(),
            command: "npx".into(),
            args: vec!["-y".into(), "@modelcontextprotocol/server-slack".into()],
            env,
            enabled: true,
            connected: false,
            tools_count: 0,
        };
        let cfg = record.to_config();
        assert_eq!(cfg.command, "npx");
        assert_eq!(cfg.env.get("TOKEN").unwrap(), "secret");
    }
}
