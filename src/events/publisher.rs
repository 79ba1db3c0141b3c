use crate::constants::{events, SignerRole};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Something that happened to a document's signature flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum FlowEvent {
    FlowDefined {
        document_id: Uuid,
        stage_count: usize,
    },
    SignatureRecorded {
        document_id: Uuid,
        user_id: Uuid,
        role: SignerRole,
    },
    StageCompleted {
        document_id: Uuid,
        flow_stage_id: i64,
        role: SignerRole,
        next_role: Option<SignerRole>,
    },
    FlowCompleted {
        document_id: Uuid,
    },
}

impl FlowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FlowDefined { .. } => events::FLOW_DEFINED,
            Self::SignatureRecorded { .. } => events::SIGNATURE_RECORDED,
            Self::StageCompleted { .. } => events::STAGE_COMPLETED,
            Self::FlowCompleted { .. } => events::FLOW_COMPLETED,
        }
    }

    pub fn document_id(&self) -> Uuid {
        match self {
            Self::FlowDefined { document_id, .. }
            | Self::SignatureRecorded { document_id, .. }
            | Self::StageCompleted { document_id, .. }
            | Self::FlowCompleted { document_id } => *document_id,
        }
    }
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub name: &'static str,
    pub event: FlowEvent,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

/// Broadcast publisher for flow lifecycle events
#[derive(Debug, Clone)]
pub struct FlowEventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

impl FlowEventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event; having no subscribers is not an error
    pub fn publish(&self, event: FlowEvent) {
        let published = PublishedEvent {
            name: event.name(),
            event,
            published_at: chrono::Utc::now(),
        };

        if self.sender.send(published).is_err() {
            tracing::trace!("No flow event subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for FlowEventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let publisher = FlowEventPublisher::new(4);
        publisher.publish(FlowEvent::FlowCompleted {
            document_id: Uuid::new_v4(),
        });
        assert_eq!(publisher.subscriber_count(), 0);
    }

    #[test]
    fn test_subscriber_receives_named_event() {
        let publisher = FlowEventPublisher::default();
        let mut receiver = publisher.subscribe();
        let document_id = Uuid::new_v4();

        publisher.publish(FlowEvent::FlowDefined {
            document_id,
            stage_count: 2,
        });

        let published = receiver.try_recv().unwrap();
        assert_eq!(published.name, events::FLOW_DEFINED);
        assert_eq!(published.event.document_id(), document_id);
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = FlowEvent::SignatureRecorded {
            document_id: Uuid::nil(),
            user_id: Uuid::nil(),
            role: SignerRole::Management,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "signature_recorded");
        assert_eq!(json["data"]["role"], "management");
    }
}
