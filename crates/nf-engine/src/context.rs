//! `EngineContext` — the composition root (design notes §9,
//! "process-wide singletons -> explicit context"), grounded on
//! `crates/gateway/src/state.rs`'s `AppState`: `Arc`-wrapped fields grouped
//! by concern, built once at startup, cheap to `Clone` and pass to handlers.

use std::sync::Arc;

use nf_forecast::CostForecaster;
use nf_mcp::McpManager;
use nf_nodes::NodeRegistry;
use nf_observability::ObservabilityManager;
use nf_tools::ToolRegistry;
use parking_lot::RwLock as SyncRwLock;
use tokio::sync::RwLock as AsyncRwLock;

const DEFAULT_MAX_TRACES: usize = 1000;

/// Everything a workflow execution needs, assembled once and shared.
///
/// Node/tool registries are read-mostly after startup (spec.md §5) and use
/// a plain sync `RwLock`; the MCP manager's operations are themselves
/// async (subprocess spawn, JSON-RPC round trips), so it is behind an async
/// `RwLock` instead.
#[derive(Clone)]
pub struct EngineContext {
    pub nodes: Arc<SyncRwLock<NodeRegistry>>,
    pub tools: Arc<SyncRwLock<ToolRegistry>>,
    pub mcp: Arc<AsyncRwLock<McpManager>>,
    pub observability: Arc<ObservabilityManager>,
    pub forecaster: Arc<CostForecaster<Arc<ObservabilityManager>>>,
    /// Read-only pricing catalog; stateless, so it is a `'static` slice
    /// rather than a field requiring its own lock.
    pub pricing: &'static [nf_pricing::ModelPricing],
}

impl EngineContext {
    pub fn new() -> Self {
        Self::with_trace_capacity(DEFAULT_MAX_TRACES)
    }

    pub fn with_trace_capacity(max_traces: usize) -> Self {
        let observability = Arc::new(ObservabilityManager::new(max_traces));
        let forecaster = Arc::new(CostForecaster::new(Arc::clone(&observability)));
        Self {
            nodes: Arc::new(SyncRwLock::new(NodeRegistry::new())),
            tools: Arc::new(SyncRwLock::new(ToolRegistry::new())),
            mcp: Arc::new(AsyncRwLock::new(McpManager::empty())),
            observability,
            forecaster,
            pricing: nf_pricing::MODEL_PRICING,
        }
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}
