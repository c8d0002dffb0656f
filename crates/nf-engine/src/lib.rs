//! Composition root: wires every other `nf-*` crate into one
//! [`EngineContext`] and drives workflow execution with [`WorkflowExecutor`].

pub mod context;
pub mod error;
pub mod executor;
pub mod workflow;

pub use context::EngineContext;
pub use error::EngineError;
pub use executor::{ExecutionReport, WorkflowExecutor};
pub use workflow::{WorkflowDefinition, WorkflowNodeSpec};

/// Installs a JSON `tracing` subscriber reading `RUST_LOG`. Library crates
/// never do this themselves (§1 "ambient stack"); a host opts in by
/// enabling the `tracing-init` feature and calling this once at startup.
#[cfg(feature = "tracing-init")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,nf_engine=debug")))
        .json()
        .init();
}
