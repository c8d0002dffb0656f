//! Decouples the forecaster from `nf-observability`'s concrete trace store
//! (`SPEC_FULL.md` §3's resolved open question: durability is a host
//! concern, not a forecaster concern).

use std::sync::Arc;

use nf_domain::Trace;
use nf_observability::ObservabilityManager;

/// Supplies historical traces for one workflow. `nf-observability`'s
/// in-memory manager is the default implementation; a host may swap in a
/// durable store without touching the forecaster.
pub trait TraceSource {
    fn list_traces(&self, workflow_id: &str, limit: usize) -> Vec<Trace>;
}

impl TraceSource for ObservabilityManager {
    fn list_traces(&self, workflow_id: &str, limit: usize) -> Vec<Trace> {
        ObservabilityManager::list_traces(self, Some(workflow_id), limit)
    }
}

/// Lets a host share one `Arc`-owned store between the observability
/// manager and the forecaster instead of requiring a second owner.
impl<T: TraceSource + ?Sized> TraceSource for Arc<T> {
    fn list_traces(&self, workflow_id: &str, limit: usize) -> Vec<Trace> {
        (**self).list_traces(workflow_id, limit)
    }
}
