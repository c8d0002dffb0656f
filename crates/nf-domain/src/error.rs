//! Shared error taxonomy used across all `nf-*` crates.
//!
//! Each crate owns its own detailed error enum (`nf_retry::RetryError`,
//! `nf_mcp::McpError`, `nf_nodes::NodeError`, ...) and converts into this
//! umbrella type at its public boundary, so a caller holding only
//! `nf_domain::Error` never has to match on crate-specific variants unless it
//! wants the detail.

/// Shared error type used across all workflow-engine crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("timeout: {0}")]
    Timeout(String),

    /// Node config failed schema validation (§4.2). Carries every violation,
    /// not just the first.
    #[error("configuration invalid: {0:?}")]
    ConfigurationInvalid(Vec<String>),

    /// `NodeRegistry::get` missed; carries the known type list.
    #[error("node type '{requested}' not found; known types: {known:?}")]
    NodeTypeUnknown { requested: String, known: Vec<String> },

    /// Wraps any non-validation error escaping a node's `execute`.
    #[error("node '{node_type}' execution failed: {cause}")]
    NodeExecutionFailure { node_type: String, cause: String },

    /// Transient upstream fault; consumed by the retry engine and only
    /// surfaces here after the retry budget is exhausted.
    #[error("retryable error: {0}")]
    Retryable(String),

    /// Permanent upstream fault; the retry engine never retries this.
    #[error("non-retryable error: {0}")]
    NonRetryable(String),

    /// MCP subprocess refused to start, or the configured command is
    /// missing. Carries up to 500 bytes of the process's stderr.
    #[error("MCP server setup failed: {0}")]
    McpSetupFailed(String),

    /// MCP handshake (`initialize`/`tools/list`) failed or the transport
    /// broke mid-session.
    #[error("MCP connection failed: {0}")]
    McpConnectionFailed(String),

    /// A `tools/call` returned a JSON-RPC error envelope, or the response
    /// could not be parsed.
    #[error("MCP tool call failed: {0}")]
    McpCallFailed(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
