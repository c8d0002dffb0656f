//! Workflow executor: walks a [`WorkflowDefinition`]'s DAG, invoking each
//! node through its registry entry, binding a span per node under one
//! trace (spec.md §2, §5, §9 "cooperative async -> task + channel model").
//!
//! Dispatch is bounded by a semaphore and each node runs inside
//! `catch_unwind`, grounded on `crates/node-sdk/src/client.rs`'s tool
//! dispatch (`Semaphore` permit per call, `AssertUnwindSafe(...).catch_unwind()`
//! around the handler so a panicking node still produces a response instead
//! of taking down the executor).

use std::collections::{HashMap, HashSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use nf_domain::{Error as DomainError, SpanType};
use nf_nodes::NodeIo;
use serde_json::Value;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::context::EngineContext;
use crate::error::EngineError;
use crate::workflow::{WorkflowDefinition, WorkflowNodeSpec};

const DEFAULT_MAX_CONCURRENT_NODES: usize = 8;

/// Outcome of one workflow run: which nodes succeeded with what output,
/// which failed, and the trace that recorded the whole thing.
#[derive(Debug)]
pub struct ExecutionReport {
    pub trace_id: Uuid,
    pub execution_id: Uuid,
    pub outputs: HashMap<String, NodeIo>,
    pub failures: HashMap<String, EngineError>,
}

impl ExecutionReport {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct WorkflowExecutor {
    context: EngineContext,
    max_concurrent_nodes: usize,
}

struct NodeOutcome {
    id: String,
    result: Result<NodeIo, EngineError>,
}

impl WorkflowExecutor {
    pub fn new(context: EngineContext) -> Self {
        Self::with_concurrency(context, DEFAULT_MAX_CONCURRENT_NODES)
    }

    pub fn with_concurrency(context: EngineContext, max_concurrent_nodes: usize) -> Self {
        Self { context, max_concurrent_nodes }
    }

    /// Runs every node in `workflow` respecting `depends_on` edges,
    /// dispatching ready nodes concurrently up to the configured bound.
    /// Returns once every node has completed, failed, or the workflow graph
    /// is exhausted after a dependency fails.
    pub async fn execute(
        &self,
        workflow: &WorkflowDefinition,
        query: Option<String>,
        cancel: CancellationToken,
    ) -> Result<ExecutionReport, EngineError> {
        let order = topological_check(workflow)?;
        let _ = order; // validated; actual dispatch order is dependency-driven below

        let execution_id = Uuid::new_v4();
        let trace_id = self.context.observability.start_trace(workflow.workflow_id.clone(), execution_id, query);
        let root_span_id = self
            .context
            .observability
            .start_span(trace_id, SpanType::WorkflowStart, None, None)
            .map_err(|e| EngineError::Node(DomainError::Other(e.to_string())))?;

        let mut remaining: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
        for node in &workflow.nodes {
            remaining.insert(&node.id, node.depends_on.len());
            dependents.entry(node.id.as_str()).or_default();
        }
        for node in &workflow.nodes {
            for dep in &node.depends_on {
                dependents.entry(dep.as_str()).or_default().push(&node.id);
            }
        }

        let mut ready: VecDeque<&str> = remaining
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut outputs: HashMap<String, NodeIo> = HashMap::new();
        let mut failures: HashMap<String, EngineError> = HashMap::new();
        let mut pending: HashSet<String> = workflow.nodes.iter().map(|n| n.id.clone()).collect();

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_nodes));
        let (tx, mut rx) = mpsc::channel::<NodeOutcome>(workflow.nodes.len().max(1));
        let mut in_flight = 0usize;

        loop {
            while let Some(node_id) = ready.pop_front() {
                pending.remove(node_id);
                let spec = workflow.node(node_id).expect("ready id came from workflow.nodes").clone();
                let inputs = gather_inputs(workflow, &spec, &outputs);

                if cancel.is_cancelled() {
                    failures.insert(spec.id.clone(), EngineError::Cancelled(spec.id.clone()));
                    continue;
                }

                let permit = Arc::clone(&semaphore).acquire_owned().await.expect("semaphore never closed");
                let context = self.context.clone();
                let tx = tx.clone();
                let cancel = cancel.clone();
                in_flight += 1;
                tokio::spawn(async move {
                    let _permit = permit;
                    let result = run_node(&context, &spec, inputs, trace_id, root_span_id, &cancel).await;
                    let _ = tx.send(NodeOutcome { id: spec.id, result }).await;
                });
            }

            if in_flight == 0 {
                break;
            }

            let Some(outcome) = rx.recv().await else {
                break;
            };
            in_flight -= 1;

            match outcome.result {
                Ok(node_outputs) => {
                    outputs.insert(outcome.id.clone(), node_outputs);
                    if let Some(children) = dependents.get(outcome.id.as_str()) {
                        for &child in children {
                            if let Some(count) = remaining.get_mut(child) {
                                *count -= 1;
                                if *count == 0 && pending.contains(child) {
                                    ready.push_back(child);
                                }
                            }
                        }
                    }
                }
                Err(err) => {
                    failures.insert(outcome.id, err);
                }
            }
        }

        // Any node never dispatched because a dependency failed is reported
        // as skipped via its own failure entry, not silently dropped.
        for node_id in pending {
            failures
                .entry(node_id.clone())
                .or_insert_with(|| EngineError::SkippedUpstreamFailure(node_id));
        }

        self.context.observability.complete_span(root_span_id, None, None, None);
        if failures.is_empty() {
            self.context.observability.complete_trace(trace_id);
        } else {
            self.context
                .observability
                .fail_span(root_span_id, format!("{} node(s) failed", failures.len()), None);
        }

        Ok(ExecutionReport { trace_id, execution_id, outputs, failures })
    }
}

/// Merges every dependency's output into one flat map, later-declared
/// dependencies winning on key conflicts, seeded with the workflow's
/// `seed_inputs` first. Namespacing per-producer is left to config-level
/// field naming, since spec.md leaves wiring format unspecified (§2 only
/// says "nodes emit ... outputs").
fn gather_inputs(workflow: &WorkflowDefinition, spec: &WorkflowNodeSpec, outputs: &HashMap<String, NodeIo>) -> NodeIo {
    let mut inputs = workflow.seed_inputs.clone();
    for dep in &spec.depends_on {
        if let Some(dep_outputs) = outputs.get(dep) {
            for (k, v) in dep_outputs {
                inputs.insert(k.clone(), v.clone());
            }
        }
    }
    inputs
}

async fn run_node(
    context: &EngineContext,
    spec: &WorkflowNodeSpec,
    inputs: NodeIo,
    trace_id: Uuid,
    parent_span_id: Uuid,
    cancel: &CancellationToken,
) -> Result<NodeIo, EngineError> {
    let span_id = context
        .observability
        .start_span(trace_id, SpanType::NodeExecution, Some(parent_span_id), Some(Value::Object(inputs.clone())))
        .map_err(|e| EngineError::Node(DomainError::Other(e.to_string())))?;

    let node = match context.nodes.read().get(&spec.node_type) {
        Ok(node) => node,
        Err(e) => {
            context.observability.fail_span(span_id, e.to_string(), Some("node_type_unknown".into()));
            return Err(EngineError::Node(e));
        }
    };

    let exec = AssertUnwindSafe(node.execute_safe(&inputs, &spec.config)).catch_unwind();

    let outcome = tokio::select! {
        result = exec => result,
        _ = cancel.cancelled() => {
            context.observability.fail_span(span_id, "workflow cancelled", Some("cancelled".into()));
            return Err(EngineError::Cancelled(spec.id.clone()));
        }
    };

    match outcome {
        Ok(Ok(node_outputs)) => {
            context.observability.complete_span(span_id, Some(Value::Object(node_outputs.clone())), None, None);
            Ok(node_outputs)
        }
        Ok(Err(e)) => {
            context.observability.fail_span(span_id, e.to_string(), None);
            Err(EngineError::Node(e))
        }
        Err(_panic) => {
            tracing::error!(node_id = %spec.id, node_type = %spec.node_type, "node panicked");
            context.observability.fail_span(span_id, "node panicked", Some("panic".into()));
            Err(EngineError::Node(DomainError::Other("node panicked".into())))
        }
    }
}

/// Kahn's algorithm: validates every `depends_on` id exists and the graph
/// has no cycle, returning one valid topological order.
fn topological_check(workflow: &WorkflowDefinition) -> Result<Vec<String>, EngineError> {
    let ids: HashSet<&str> = workflow.nodes.iter().map(|n| n.id.as_str()).collect();
    for node in &workflow.nodes {
        for dep in &node.depends_on {
            if !ids.contains(dep.as_str()) {
                return Err(EngineError::UnknownDependency(node.id.clone(), dep.clone()));
            }
        }
    }

    let mut in_degree: HashMap<&str, usize> = workflow.nodes.iter().map(|n| (n.id.as_str(), n.depends_on.len())).collect();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for node in &workflow.nodes {
        for dep in &node.depends_on {
            dependents.entry(dep.as_str()).or_default().push(&node.id);
        }
    }

    let mut queue: VecDeque<&str> = in_degree.iter().filter(|(_, &d)| d == 0).map(|(id, _)| *id).collect();
    let mut order = Vec::with_capacity(workflow.nodes.len());
    while let Some(id) = queue.pop_front() {
        order.push(id.to_string());
        if let Some(children) = dependents.get(id) {
            for &child in children {
                let count = in_degree.get_mut(child).expect("child is a known node id");
                *count -= 1;
                if *count == 0 {
                    queue.push_back(child);
                }
            }
        }
    }

    if order.len() != workflow.nodes.len() {
        let stuck = workflow
            .nodes
            .iter()
            .find(|n| !order.contains(&n.id))
            .expect("fewer ordered nodes than total means at least one is unordered");
        return Err(EngineError::CyclicWorkflow(stuck.id.clone()));
    }

    Ok(order)
}
