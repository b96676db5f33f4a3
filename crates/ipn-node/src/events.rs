//! Lifecycle notifications.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeEvent {
    Init,
    Start,
    Stop,
    /// A lifecycle step failed; carries the error message.
    Error(String),
}

#[derive(Debug)]
pub(crate) struct EventBus {
    tx: broadcast::Sender<NodeEvent>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<NodeEvent> {
        self.tx.subscribe()
    }

    /// Send to current subscribers. Nobody listening is fine.
    pub(crate) fn emit(&self, event: NodeEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_later_events() {
        let bus = EventBus::new();
        bus.emit(NodeEvent::Init);

        let mut rx = bus.subscribe();
        bus.emit(NodeEvent::Start);
        bus.emit(NodeEvent::Error("boom".into()));

        assert_eq!(rx.recv().await.unwrap(), NodeEvent::Start);
        assert_eq!(rx.recv().await.unwrap(), NodeEvent::Error("boom".into()));
    }
}
