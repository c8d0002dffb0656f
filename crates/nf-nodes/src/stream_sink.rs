//! The stream manager a node publishes to is an external collaborator: its
//! only contract is "accept an event; deliver it eventually." This trait is
//! that seam — `nf-engine` supplies a concrete implementation backed by
//! whatever transport it wires to callers (SSE, websocket, channel).

use nf_domain::StreamEvent;

/// Accepts stream events from node execution. Implementations must not
/// block the caller; best-effort delivery, per spec.
pub trait StreamSink: Send + Sync {
    fn publish(&self, event: StreamEvent);
}

/// A sink that drops every event. Used when a node runs with no bound
/// `execution_id`, and as a test default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl StreamSink for NullSink {
    fn publish(&self, _event: StreamEvent) {}
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Captures published events for assertion in other modules' tests.
    #[derive(Default, Clone)]
    pub(crate) struct CapturingSink {
        pub(crate) events: Arc<Mutex<Vec<StreamEvent>>>,
    }

    impl StreamSink for CapturingSink {
        fn publish(&self, event: StreamEvent) {
            self.events.lock().push(event);
        }
    }

    #[test]
    fn null_sink_drops_silently() {
        let sink = NullSink;
        sink.publish(StreamEvent::log("n1", uuid::Uuid::new_v4(), "info", "hi"));
    }
}
