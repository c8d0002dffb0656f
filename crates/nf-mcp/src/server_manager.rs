//! Per-tenant lifecycle over [`McpManager`]: the persistent set of
//! configured servers, preset-backed onboarding, and connect/disconnect.
//!
//! One `McpServerManager` per tenant key. Storage is either a per-tenant
//! database (via the [`ServerStore`] trait, a collaborator this crate does
//! not implement) or a single-tenant local JSON file — never both at once
//! for a given instance.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::McpServerRecord;
use crate::manager::{McpError, McpManager};
use crate::presets::{find_preset, ServerType};

/// Durable storage for one tenant's server records. A host backed by a
/// real database implements this; `JsonFileStore` is the local-dev
/// fallback used when no such collaborator is wired up.
#[async_trait]
pub trait ServerStore: Send + Sync {
    async fn load(&self) -> Vec<McpServerRecord>;
    async fn save(&self, records: &[McpServerRecord]);
}

/// Single-tenant local file store, the default when no database-backed
/// `ServerStore` is supplied.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Serialize, Deserialize, Default)]
struct FileContents {
    #[serde(default)]
    servers: Vec<McpServerRecord>,
}

#[async_trait]
impl ServerStore for JsonFileStore {
    async fn load(&self) -> Vec<McpServerRecord> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => match serde_json::from_str::<FileContents>(&raw) {
                Ok(contents) => contents.servers,
                Err(e) => {
                    tracing::error!(error = %e, path = %self.path.display(), "failed to parse MCP server config file");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::error!(error = %e, path = %self.path.display(), "failed to read MCP server config file");
                Vec::new()
            }
        }
    }

    async fn save(&self, records: &[McpServerRecord]) {
        let contents = FileContents {
            servers: records.to_vec(),
        };
        let json = match serde_json::to_string_pretty(&contents) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize MCP server config");
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                tracing::error!(error = %e, "failed to create MCP server config directory");
                return;
            }
        }
        if let Err(e) = tokio::fs::write(&self.path, json).await {
            tracing::error!(error = %e, path = %self.path.display(), "failed to save MCP server config");
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerManagerError {
    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("missing required environment variable(s) for preset '{preset}': {missing:?}")]
    MissingEnvVars { preset: String, missing: Vec<String> },

    #[error("executable preset '{0}' requires a command path")]
    MissingExecutablePath(String),

    #[error("server '{0}' not found")]
    ServerNotFound(String),

    #[error("server '{0}' is disabled")]
    ServerDisabled(String),

    #[error(transparent)]
    Mcp(#[from] McpError),
}

/// Manages the persistent record set plus the live [`McpManager`] for one
/// tenant.
pub struct McpServerManager {
    store: Box<dyn ServerStore>,
    records: HashMap<String, McpServerRecord>,
    manager: McpManager,
}

impl McpServerManager {
    pub async fn new(store: Box<dyn ServerStore>) -> Self {
        let loaded = store.load().await;
        let mut records = HashMap::new();
        for mut record in loaded {
            record.connected = false; // always start disconnected
            records.insert(record.name.clone(), record);
        }
        tracing::info!(count = records.len(), "loaded MCP server configurations");
        Self {
            store,
            records,
            manager: McpManager::empty(),
        }
    }

    pub fn with_json_file(path: impl AsRef<Path>) -> JsonFileStoreBuilder {
        JsonFileStoreBuilder {
            path: path.as_ref().to_path_buf(),
        }
    }

    async fn persist(&self) {
        let records: Vec<McpServerRecord> = self.records.values().cloned().collect();
        self.store.save(&records).await;
    }

    pub fn get_preset(&self, id: &str) -> Option<&'static crate::presets::McpServerPreset> {
        find_preset(id)
    }

    pub fn list_presets(&self) -> &'static [crate::presets::McpServerPreset] {
        crate::presets::MCP_SERVER_PRESETS
    }

    /// Validates required env vars (unless the preset is `executable`,
    /// where the user supplies the command instead), persists the record,
    /// and does NOT connect — connecting is a separate explicit step.
    pub async fn add_server_from_preset(
        &mut self,
        preset_id: &str,
        env_values: HashMap<String, String>,
        custom_name: Option<String>,
        executable_path: Option<String>,
    ) -> Result<McpServerRecord, ServerManagerError> {
        let preset = find_preset(preset_id)
            .ok_or_else(|| ServerManagerError::UnknownPreset(preset_id.to_string()))?;

        if preset.server_type != ServerType::Executable {
            let missing: Vec<String> = preset
                .required_env_vars
                .iter()
                .filter(|v| !env_values.contains_key(**v))
                .map(|v| v.to_string())
                .collect();
            if !missing.is_empty() {
                return Err(ServerManagerError::MissingEnvVars {
                    preset: preset_id.to_string(),
                    missing,
                });
            }
        }

        let name = custom_name.unwrap_or_else(|| preset_id.to_string());
        let command = if preset.server_type == ServerType::Executable && preset.command.is_empty() {
            executable_path
                .ok_or_else(|| ServerManagerError::MissingExecutablePath(preset_id.to_string()))?
        } else {
            preset.command.to_string()
        };

        let record = McpServerRecord {
            name: name.clone(),
            preset: Some(preset_id.to_string()),
            display_name: preset.display_name.to_string(),
            description: preset.description.to_string(),
            command,
            args: preset.args.iter().map(|s| s.to_string()).collect(),
            env: env_values,
            enabled: true,
            connected: false,
            tools_count: 0,
        };

        self.records.insert(name, record.clone());
        self.persist().await;
        tracing::info!(server = %record.name, preset = preset_id, "added MCP server from preset");
        Ok(record)
    }

    pub async fn add_custom_server(
        &mut self,
        name: String,
        display_name: String,
        command: String,
        args: Vec<String>,
        env: HashMap<String, String>,
    ) -> McpServerRecord {
        let record = McpServerRecord {
            name: name.clone(),
            preset: None,
            display_name,
            description: String::new(),
            command,
            args,
            env,
            enabled: true,
            connected: false,
            tools_count: 0,
        };
        self.records.insert(name, record.clone());
        self.persist().await;
        record
    }

    pub async fn remove_server(&mut self, name: &str) {
        self.manager.disconnect_server(name).await;
        self.records.remove(name);
        self.persist().await;
    }

    /// Resolve the record by name, fail if missing or disabled, invoke the
    /// client, then update and persist the record's live connection state.
    pub async fn connect_server(&mut self, name: &str) -> Result<(), ServerManagerError> {
        let record = self
            .records
            .get(name)
            .ok_or_else(|| ServerManagerError::ServerNotFound(name.to_string()))?;
        if !record.enabled {
            return Err(ServerManagerError::ServerDisabled(name.to_string()));
        }
        let config = record.to_config();

        let tool_count = self.manager.add_server(&config).await?;

        let record = self.records.get_mut(name).expect("checked above");
        record.connected = true;
        record.tools_count = tool_count;
        self.persist().await;
        Ok(())
    }

    pub async fn disconnect_server(&mut self, name: &str) {
        self.manager.disconnect_server(name).await;
        if let Some(record) = self.records.get_mut(name) {
            record.connected = false;
            record.tools_count = 0;
        }
        self.persist().await;
    }

    /// Connect every enabled-but-not-yet-connected server, logging and
    /// skipping failures rather than aborting the whole batch.
    pub async fn connect_all_enabled(&mut self) {
        let names: Vec<String> = self
            .records
            .values()
            .filter(|r| r.enabled && !r.connected)
            .map(|r| r.name.clone())
            .collect();
        for name in names {
            if let Err(e) = self.connect_server(&name).await {
                tracing::warn!(server = %name, error = %e, "failed to connect MCP server");
            }
        }
    }

    pub async fn disconnect_all(&mut self) {
        let names: Vec<String> = self.records.keys().cloned().collect();
        for name in names {
            self.disconnect_server(&name).await;
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &McpServerRecord> {
        self.records.values()
    }

    pub fn manager(&self) -> &McpManager {
        &self.manager
    }
}

pub struct JsonFileStoreBuilder {
    path: PathBuf,
}

impl JsonFileStoreBuilder {
    pub async fn build(self) -> McpServerManager {
        McpServerManager::new(Box::new(JsonFileStore::new(self.path))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct InMemoryStore {
        records: std::sync::Mutex<Vec<McpServerRecord>>,
    }

    #[async_trait]
    impl ServerStore for InMemoryStore {
        async fn load(&self) -> Vec<McpServerRecord> {
            self.records.lock().unwrap().clone()
        }
        async fn save(&self, records: &[McpServerRecord]) {
            *self.records.lock().unwrap() = records.to_vec();
        }
    }

    async fn empty_manager() -> McpServerManager {
        McpServerManager::new(Box::new(InMemoryStore {
            records: std::sync::Mutex::new(Vec::new()),
        }))
        .await
    }

    #[tokio::test]
    async fn add_from_preset_requires_env_vars() {
        let mut mgr = empty_manager().await;
        let err = mgr
            .add_server_from_preset("slack", HashMap::new(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerManagerError::MissingEnvVars { .. }));
    }

    #[tokio::test]
    async fn add_from_preset_succeeds_with_env_vars() {
        let mut mgr = empty_manager().await;
        let mut env = HashMap::new();
        env.insert("SLACK_BOT_TOKEN".to_string(), "xoxb-test".to_string());
        env.insert("SLACK_TEAM_ID".to_string(), "T123".to_string());
        let record = mgr
            .add_server_from_preset("slack", env, None, None)
            .await
            .unwrap();
        assert_eq!(record.name, "slack");
        assert!(!record.connected);
        assert_eq!(mgr.records().count(), 1);
    }

    #[tokio::test]
    async fn executable_preset_skips_env_validation_but_needs_path() {
        let mut mgr = empty_manager().await;
        let err = mgr
            .add_server_from_preset("gmail", HashMap::new(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerManagerError::MissingExecutablePath(_)));

        let record = mgr
            .add_server_from_preset(
                "gmail",
                HashMap::new(),
                None,
                Some("/usr/local/bin/auto-gmail".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(record.command, "/usr/local/bin/auto-gmail");
    }

    #[tokio::test]
    async fn unknown_preset_rejected() {
        let mut mgr = empty_manager().await;
        let err = mgr
            .add_server_from_preset("not-a-real-preset", HashMap::new(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerManagerError::UnknownPreset(_)));
    }

    #[tokio::test]
    async fn connect_unknown_server_fails() {
        let mut mgr = empty_manager().await;
        let err = mgr.connect_server("nope").await.unwrap_err();
        assert!(matches!(err, ServerManagerError::ServerNotFound(_)));
    }
}
