use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contract::model::Message;

/// Transport-agnostic domain event.
#[derive(Debug, Clone)]
pub enum ChatDomainEvent {
    ChatCreated {
        chat_id: Uuid,
        sender_id: Uuid,
        receiver_id: Uuid,
        at: DateTime<Utc>,
    },
    MessageCreated {
        message: Message,
    },
    MessagesRead {
        chat_id: Uuid,
        reader_id: Uuid,
        count: u64,
        at: DateTime<Utc>,
    },
}

impl ChatDomainEvent {
    pub fn chat_id(&self) -> Uuid {
        match self {
            Self::ChatCreated { chat_id, .. } | Self::MessagesRead { chat_id, .. } => *chat_id,
            Self::MessageCreated { message } => message.chat_id,
        }
    }
}
