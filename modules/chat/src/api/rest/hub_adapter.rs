use std::sync::Arc;

use crate::api::rest::dto::ServerFrame;
use crate::domain::events::ChatDomainEvent;
use crate::domain::ports::EventPublisher;
use crate::infra::realtime::ChatHub;

/// Forwards domain events to the chat's live subscribers.
pub struct HubEventPublisher {
    hub: Arc<ChatHub<ServerFrame>>,
}

impl HubEventPublisher {
    pub fn new(hub: Arc<ChatHub<ServerFrame>>) -> Self {
        Self { hub }
    }
}

impl EventPublisher<ChatDomainEvent> for HubEventPublisher {
    fn publish(&self, event: &ChatDomainEvent) {
        let frame = match event {
            ChatDomainEvent::MessageCreated { message } => ServerFrame::MessageCreated {
                chat_id: message.chat_id,
                message: message.clone().into(),
            },
            ChatDomainEvent::MessagesRead {
                chat_id,
                reader_id,
                count,
                at,
            } => ServerFrame::MessagesRead {
                chat_id: *chat_id,
                reader_id: *reader_id,
                count: *count,
                at: *at,
            },
            // Nobody can be subscribed to a chat that did not exist.
            ChatDomainEvent::ChatCreated { chat_id, .. } => {
                tracing::debug!(%chat_id, "Chat created, no subscribers to notify");
                return;
            }
        };
        let delivered = self.hub.publish(event.chat_id(), frame);
        tracing::trace!(chat_id = %event.chat_id(), delivered, "Event fanned out");
    }
}
