//! Resolution Event Bus
//!
//! Asynchronous pub/sub for resolution telemetry. Publishing never blocks and
//! never fails; events sent while nobody listens are dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events emitted by the resolution engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum TagEvent {
    /// A loader ran to completion
    RequisiteLoaded { app: String, requisite: String, elapsed_ms: u128 },
    /// A loader returned an error, timed out or panicked
    RequisiteFailed { app: String, requisite: String, error: String },
    /// A resolution joined all of its loads. Scheduled groups that neither
    /// loaded nor failed were satisfied by another resolution meanwhile.
    ResolutionFinished {
        app: String,
        checked: usize,
        scheduled: usize,
        loaded: usize,
        failed: usize,
        at: DateTime<Utc>,
    },
}

pub struct EventBus {
    tx: broadcast::Sender<TagEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: TagEvent) {
        let _ = self.tx.send(event);
    }

    /// Create a new subscriber
    pub fn subscribe(&self) -> broadcast::Receiver<TagEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(TagEvent::RequisiteFailed {
            app: "package:a".into(),
            requisite: "archive-entries".into(),
            error: "boom".into(),
        });
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, TagEvent::RequisiteFailed { ref requisite, .. } if requisite == "archive-entries"));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        bus.publish(TagEvent::RequisiteLoaded { app: "a".into(), requisite: "r".into(), elapsed_ms: 1 });
    }

    #[test]
    fn test_event_wire_shape() {
        let event = TagEvent::RequisiteLoaded { app: "a".into(), requisite: "r".into(), elapsed_ms: 5 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "RequisiteLoaded");
        assert_eq!(json["payload"]["requisite"], "r");
    }
}
