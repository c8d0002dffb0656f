//! Workflow topology: the graph the executor walks. Not named by spec.md,
//! which treats "the executor invokes nodes" as a given (§2); this is the
//! minimal shape needed to drive that invocation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One node placed in a workflow, with its static config and the ids of
/// nodes whose outputs it consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowNodeSpec {
    /// Unique within the workflow; used for dependency edges and to
    /// address this node's outputs from downstream nodes.
    pub id: String,
    pub node_type: String,
    #[serde(default)]
    pub config: serde_json::Map<String, Value>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// A workflow: a named DAG of node specs plus the inputs seeded at the
/// roots (nodes with no `depends_on`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub workflow_id: String,
    pub nodes: Vec<WorkflowNodeSpec>,
    #[serde(default)]
    pub seed_inputs: serde_json::Map<String, Value>,
}

impl WorkflowDefinition {
    pub fn node(&self, id: &str) -> Option<&WorkflowNodeSpec> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
