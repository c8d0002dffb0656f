use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One append-only event emitted by a running node. Events are never
/// mutated once emitted; a consumer reconstructs progress by replaying
/// them in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamEvent {
    pub event_kind: StreamEventKind,
    pub node_id: String,
    pub execution_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEventKind {
    NodeStarted,
    /// Payload carries `{fraction: 0..1, message}`.
    NodeProgress,
    /// Payload carries the partial or final output value.
    NodeOutput,
    /// Payload carries `{level, message}`.
    Log,
    NodeCompleted,
    NodeFailed,
}

impl StreamEvent {
    pub fn new(
        event_kind: StreamEventKind,
        node_id: impl Into<String>,
        execution_id: Uuid,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_kind,
            node_id: node_id.into(),
            execution_id,
            agent: None,
            task: None,
            payload,
            timestamp: Utc::now(),
        }
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    pub fn progress(
        node_id: impl Into<String>,
        execution_id: Uuid,
        fraction: f64,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            StreamEventKind::NodeProgress,
            node_id,
            execution_id,
            serde_json::json!({ "fraction": fraction.clamp(0.0, 1.0), "message": message.into() }),
        )
    }

    pub fn log(
        node_id: impl Into<String>,
        execution_id: Uuid,
        level: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            StreamEventKind::Log,
            node_id,
            execution_id,
            serde_json::json!({ "level": level.into(), "message": message.into() }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_clamps_fraction() {
        let ev = StreamEvent::progress("n1", Uuid::nil(), 1.5, "over");
        assert_eq!(ev.payload["fraction"], 1.0);
        let ev = StreamEvent::progress("n1", Uuid::nil(), -0.2, "under");
        assert_eq!(ev.payload["fraction"], 0.0);
    }

    #[test]
    fn event_kind_serializes_snake_case() {
        let ev = StreamEvent::new(
            StreamEventKind::NodeStarted,
            "n1",
            Uuid::nil(),
            serde_json::json!({}),
        );
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["event_kind"], "node_started");
    }
}
