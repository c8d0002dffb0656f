//! MCP transport layer: a child process speaking JSON-RPC over stdin/stdout.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::Mutex;

use crate::config::McpServerConfig;
use crate::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

/// How long to wait after spawning before checking the process is still
/// alive. Catches "command not found" and missing-dependency failures that
/// would otherwise surface only as a confusing `initialize` timeout.
const STARTUP_GRACE: std::time::Duration = std::time::Duration::from_millis(500);

/// Max bytes of stderr captured when a server fails to start or dies.
const STDERR_CAPTURE_CAP: usize = 500;

/// Trait for MCP server transports.
#[async_trait]
pub trait McpTransport: Send + Sync {
    /// Send a JSON-RPC request and wait for the corresponding response.
    async fn send_request(&self, method: &str, params: Option<Value>) -> Result<JsonRpcResponse, TransportError>;

    /// Send a JSON-RPC notification (no response expected).
    async fn send_notification(&self, method: &str) -> Result<(), TransportError>;

    /// Check if the transport is still alive.
    fn is_alive(&self) -> bool;

    /// Shut down the transport gracefully.
    async fn shutdown(&self);
}

/// Errors that can occur during transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MCP server process has exited")]
    ProcessExited,

    #[error("timeout waiting for response")]
    Timeout,

    /// The subprocess exited (or never started) within the startup grace
    /// period. Carries whatever stderr was captured.
    #[error("MCP server failed to start: {stderr}")]
    SetupFailed { stderr: String },

    /// The handshake or an in-flight request failed mid-session.
    #[error("MCP server connection failed: {0}")]
    ConnectionFailed(String),

    /// A line on stdout did not parse as JSON-RPC (§4.5: non-JSON output is
    /// a framing error, not something to skip past).
    #[error("MCP server sent non-JSON output: {0}")]
    FramingError(String),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Stdio transport
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Stdio transport: communicates with a child process over stdin/stdout.
///
/// Each JSON-RPC message is a single newline-delimited line.
/// The `request_lock` serializes entire request/response cycles to prevent
/// response mismatching when multiple callers use the same server.
pub struct StdioTransport {
    stdin: Mutex<ChildStdin>,
    stdout: Mutex<BufReader<ChildStdout>>,
    child: Mutex<Child>,
    stderr: Mutex<Option<tokio::process::ChildStderr>>,
    /// Serializes full request/response cycles to prevent response mismatching.
    request_lock: Mutex<()>,
    next_id: AtomicU64,
    alive: AtomicBool,
}

impl StdioTransport {
    /// Spawn a child process from the given server config, wait out the
    /// startup grace period, and fail fast with captured stderr if the
    /// process already exited.
    pub async fn spawn(config: &McpServerConfig) -> Result<Self, TransportError> {
        let mut cmd = Self::build_command(config);
        cmd.stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(TransportError::Io)?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "failed to capture child stdin",
            )))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "failed to capture child stdout",
            )))?;

        let mut stderr = child.stderr.take();

        tokio::time::sleep(STARTUP_GRACE).await;
        if let Ok(Some(_status)) = child.try_wait() {
            let captured = if let Some(stderr) = stderr.as_mut() {
                harvest_stderr(stderr).await
            } else {
                String::new()
            };
            return Err(TransportError::SetupFailed { stderr: captured });
        }

        Ok(Self {
            stdin: Mutex::new(stdin),
            stdout: Mutex::new(BufReader::new(stdout)),
            child: Mutex::new(child),
            stderr: Mutex::new(stderr),
            request_lock: Mutex::new(()),
            next_id: AtomicU64::new(1),
            alive: AtomicBool::new(true),
        })
    }

    /// On Windows, npm/npx-installed MCP servers are frequently `.CMD`/`.BAT`
    /// shims that `CreateProcess` cannot launch directly; route them through
    /// `cmd.exe /C` instead. Every other platform runs the command as-is.
    fn build_command(config: &McpServerConfig) -> tokio::process::Command {
        #[cfg(windows)]
        {
            let needs_shell = config
                .command
                .to_ascii_lowercase()
                .ends_with(".cmd")
                || config.command.to_ascii_lowercase().ends_with(".bat");
            if needs_shell {
                let mut cmd = tokio::process::Command::new("cmd.exe");
                cmd.arg("/C").arg(&config.command).args(&config.args);
                return cmd;
            }
        }
        let mut cmd = tokio::process::Command::new(&config.command);
        cmd.args(&config.args);
        cmd
    }

    /// Get the next unique request ID.
    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Write a line of JSON to stdin.
    async fn write_line(&self, json: &str) -> Result<(), TransportError> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(TransportError::ProcessExited);
        }

        let mut stdin = self.stdin.lock().await;
        stdin.write_all(json.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Read one line of JSON from stdout. Blank lines are skipped; the
    /// first non-blank line that isn't a JSON object is a framing error
    /// (§4.5) and fails the transport immediately rather than scanning
    /// ahead for a usable line.
    async fn read_line(&self) -> Result<String, TransportError> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(TransportError::ProcessExited);
        }

        let mut stdout = self.stdout.lock().await;
        loop {
            let mut line = String::new();
            let bytes_read = stdout.read_line(&mut line).await?;
            if bytes_read == 0 {
                self.alive.store(false, Ordering::SeqCst);
                return Err(TransportError::ProcessExited);
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('{') {
                return Ok(trimmed.to_string());
            }
            self.alive.store(false, Ordering::SeqCst);
            return Err(TransportError::FramingError(trimmed.to_string()));
        }
    }

    async fn harvest_dead_child_stderr(&self) -> String {
        let mut stderr = self.stderr.lock().await;
        match stderr.as_mut() {
            Some(stderr) => harvest_stderr(stderr).await,
            None => String::new(),
        }
    }
}

/// Read up to [`STDERR_CAPTURE_CAP`] bytes from a child's stderr pipe,
/// lossily decoded, for inclusion in an error message.
async fn harvest_stderr(stderr: &mut tokio::process::ChildStderr) -> String {
    let mut buf = vec![0u8; STDERR_CAPTURE_CAP];
    match stderr.read(&mut buf).await {
        Ok(n) => String::from_utf8_lossy(&buf[..n]).trim().to_string(),
        Err(_) => String::new(),
    }
}

#[async_trait]
impl McpTransport for StdioTransport {
    async fn send_request(&self, method: &str, params: Option<Value>) -> Result<JsonRpcResponse, TransportError> {
        // Serialize the entire request/response cycle so concurrent callers
        // cannot read each other's responses.
        let _guard = self.request_lock.lock().await;

        let id = self.next_request_id();
        let req = JsonRpcRequest::new(id, method, params);
        let json = serde_json::to_string(&req)?;

        tracing::debug!(id, method, "sending MCP request");
        self.write_line(&json).await?;

        // Read lines until we get a response matching our ID.
        // MCP servers may send notifications between request/response pairs;
        // we skip those (they have no `id` field).
        let timeout = tokio::time::Duration::from_secs(30);
        let result = tokio::time::timeout(timeout, async {
            loop {
                let line = self.read_line().await?;
                // Try to parse as a response first.
                if let Ok(resp) = serde_json::from_str::<JsonRpcResponse>(&line) {
                    if resp.id == id {
                        return Ok(resp);
                    }
                    tracing::debug!(
                        expected_id = id,
                        got_id = resp.id,
                        "received response for different request, continuing"
                    );
                }
                // Otherwise it might be a notification or something else; skip it.
                tracing::debug!(line = %line, "skipping non-matching message from MCP server");
            }
        })
        .await;

        match result {
            Ok(Ok(resp)) => Ok(resp),
            Ok(Err(TransportError::ProcessExited)) => {
                let stderr = self.harvest_dead_child_stderr().await;
                Err(TransportError::ConnectionFailed(stderr))
            }
            Ok(Err(other)) => Err(other),
            Err(_) => {
                if !self.is_alive() {
                    let stderr = self.harvest_dead_child_stderr().await;
                    return Err(TransportError::ConnectionFailed(stderr));
                }
                Err(TransportError::Timeout)
            }
        }
    }

    async fn send_notification(&self, method: &str) -> Result<(), TransportError> {
        let notif = JsonRpcNotification::new(method);
        let json = serde_json::to_string(&notif)?;
        tracing::debug!(method, "sending MCP notification");
        self.write_line(&json).await
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn shutdown(&self) {
        self.alive.store(false, Ordering::SeqCst);
        let mut child = self.child.lock().await;
        // Close stdin to signal the process to exit.
        {
            let mut stdin = self.stdin.lock().await;
            if let Err(e) = stdin.shutdown().await {
                tracing::debug!(error = %e, "error closing MCP server stdin");
            }
        }
        // Give the process a moment to exit gracefully.
        let timeout = tokio::time::timeout(
            tokio::time::Duration::from_secs(5),
            child.wait(),
        )
        .await;
        match timeout {
            Ok(Ok(status)) => {
                tracing::debug!(?status, "MCP server process exited");
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "error waiting for MCP server process");
            }
            Err(_) => {
                tracing::warn!("MCP server process did not exit within timeout, killing");
                if let Err(e) = child.kill().await {
                    tracing::warn!(error = %e, "failed to kill MCP server process");
                }
            }
        }
    }
}

/// Test-only stand-ins for `McpTransport`, shared across this crate's unit
/// tests so they can build an `McpServer` without spawning a real process.
#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) struct AlwaysAlive;

    #[async_trait]
    impl McpTransport for AlwaysAlive {
        async fn send_request(&self, _method: &str, _params: Option<Value>) -> Result<JsonRpcResponse, TransportError> {
            Err(TransportError::Timeout)
        }
        async fn send_notification(&self, _method: &str) -> Result<(), TransportError> {
            Ok(())
        }
        fn is_alive(&self) -> bool {
            true
        }
        async fn shutdown(&self) {}
    }
}
