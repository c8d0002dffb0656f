//! Static catalog of popular MCP servers, keyed by preset id.
//!
//! Package names and required env vars mirror the public
//! `modelcontextprotocol/servers` registry and each provider's own setup
//! docs; this table does not reach the network, it only knows how to spawn
//! and describe the server once the user supplies credentials.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerType {
    /// Runs via `npx`; ready to use once required env vars are supplied.
    Npx,
    /// User supplies a local executable path; no env-var validation is
    /// enforced for the command itself.
    Executable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    ApiKey,
    OAuth,
    None,
}

#[derive(Debug, Clone, Serialize)]
pub struct McpServerPreset {
    pub id: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub command: &'static str,
    pub args: &'static [&'static str],
    pub required_env_vars: &'static [&'static str],
    pub category: &'static str,
    pub server_type: ServerType,
    pub auth_kind: AuthKind,
    pub setup_docs_url: Option<&'static str>,
}

macro_rules! preset {
    ($id:expr, $display:expr, $desc:expr, $cmd:expr, $args:expr, $env:expr, $cat:expr, $stype:expr, $auth:expr, $docs:expr) => {
        McpServerPreset {
            id: $id,
            display_name: $display,
            description: $desc,
            command: $cmd,
            args: &$args,
            required_env_vars: &$env,
            category: $cat,
            server_type: $stype,
            auth_kind: $auth,
            setup_docs_url: $docs,
        }
    };
}

/// All presets, in no particular order. Lookups go through `find_preset`.
pub static MCP_SERVER_PRESETS: &[McpServerPreset] = &[
    preset!(
        "slack",
        "Slack",
        "Send messages, read channels, manage a Slack workspace",
        "npx",
        ["-y", "@modelcontextprotocol/server-slack"],
        ["SLACK_BOT_TOKEN", "SLACK_TEAM_ID"],
        "communication",
        ServerType::Npx,
        AuthKind::ApiKey,
        Some("https://api.slack.com/apps")
    ),
    preset!(
        "google-drive",
        "Google Drive",
        "Read and search files in Google Drive",
        "npx",
        ["-y", "@modelcontextprotocol/server-gdrive"],
        ["GDRIVE_CREDENTIALS_PATH"],
        "storage",
        ServerType::Npx,
        AuthKind::OAuth,
        Some("https://console.cloud.google.com/apis/credentials")
    ),
    preset!(
        "filesystem",
        "Filesystem",
        "Read and write local files within allowed directories",
        "npx",
        ["-y", "@modelcontextprotocol/server-filesystem"],
        ["ALLOWED_DIRECTORIES"],
        "storage",
        ServerType::Npx,
        AuthKind::None,
        None
    ),
    preset!(
        "postgres",
        "PostgreSQL",
        "Read-only access to PostgreSQL databases",
        "npx",
        ["-y", "@modelcontextprotocol/server-postgres"],
        ["POSTGRES_CONNECTION_STRING"],
        "database",
        ServerType::Npx,
        AuthKind::ApiKey,
        None
    ),
    preset!(
        "notion",
        "Notion",
        "Read and write Notion pages and databases",
        "npx",
        ["-y", "notion-mcp-server"],
        ["NOTION_API_KEY"],
        "productivity",
        ServerType::Npx,
        AuthKind::ApiKey,
        Some("https://www.notion.so/my-integrations")
    ),
    preset!(
        "github",
        "GitHub",
        "Manage repositories, issues, and pull requests",
        "npx",
        ["-y", "@modelcontextprotocol/server-github"],
        ["GITHUB_PERSONAL_ACCESS_TOKEN"],
        "development",
        ServerType::Npx,
        AuthKind::ApiKey,
        Some("https://github.com/settings/tokens")
    ),
    preset!(
        "brave-search",
        "Brave Search",
        "Search the web using the Brave Search API",
        "npx",
        ["-y", "@modelcontextprotocol/server-brave-search"],
        ["BRAVE_API_KEY"],
        "search",
        ServerType::Npx,
        AuthKind::ApiKey,
        Some("https://brave.com/search/api/")
    ),
    preset!(
        "airtable",
        "Airtable",
        "Read and write Airtable bases",
        "npx",
        ["-y", "airtable-mcp-server"],
        ["AIRTABLE_API_KEY"],
        "business",
        ServerType::Npx,
        AuthKind::ApiKey,
        Some("https://airtable.com/create/tokens")
    ),
    preset!(
        "gmail",
        "Gmail",
        "Search emails, create drafts, manage Gmail",
        "",
        [],
        ["GMAIL_CLIENT_ID", "GMAIL_CLIENT_SECRET"],
        "communication",
        ServerType::Executable,
        AuthKind::OAuth,
        Some("https://console.cloud.google.com/apis/credentials")
    ),
    preset!(
        "google-calendar",
        "Google Calendar",
        "Manage calendar events and schedules",
        "",
        [],
        ["GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"],
        "productivity",
        ServerType::Executable,
        AuthKind::OAuth,
        Some("https://console.cloud.google.com/apis/credentials")
    ),
];

pub fn find_preset(id: &str) -> Option<&'static McpServerPreset> {
    MCP_SERVER_PRESETS.iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_known_preset() {
        let preset = find_preset("slack").unwrap();
        assert_eq!(preset.display_name, "Slack");
        assert_eq!(preset.required_env_vars, ["SLACK_BOT_TOKEN", "SLACK_TEAM_ID"]);
    }

    #[test]
    fn unknown_preset_is_none() {
        assert!(find_preset("does-not-exist").is_none());
    }

    #[test]
    fn executable_presets_have_no_command() {
        let preset = find_preset("gmail").unwrap();
        assert_eq!(preset.server_type, ServerType::Executable);
        assert_eq!(preset.command, "");
    }

    #[test]
    fn every_preset_id_is_unique() {
        let mut ids: Vec<&str> = MCP_SERVER_PRESETS.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        let mut deduped = ids.clone();
        deduped.dedup();
        assert_eq!(ids.len(), deduped.len());
    }
}
