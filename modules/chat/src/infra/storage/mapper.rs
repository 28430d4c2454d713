use crate::contract::model::{Chat, Message};
use crate::domain::repo::pair_key;
use crate::infra::storage::entity::{chat, message};
use sea_orm::Set;

impl From<chat::Model> for Chat {
    fn from(m: chat::Model) -> Self {
        Self {
            id: m.id,
            sender_id: m.sender_id,
            receiver_id: m.receiver_id,
            created_at: m.created_at,
        }
    }
}

impl From<Chat> for chat::ActiveModel {
    fn from(c: Chat) -> Self {
        let (low, high) = pair_key(c.sender_id, c.receiver_id);
        Self {
            id: Set(c.id),
            sender_id: Set(c.sender_id),
            receiver_id: Set(c.receiver_id),
            user_low: Set(low),
            user_high: Set(high),
            created_at: Set(c.created_at),
        }
    }
}

impl From<message::Model> for Message {
    fn from(m: message::Model) -> Self {
        Self {
            id: m.id,
            chat_id: m.chat_id,
            author_id: m.author_id,
            content: m.content,
            created_at: m.created_at,
            read: m.is_read,
        }
    }
}

impl From<Message> for message::ActiveModel {
    fn from(m: Message) -> Self {
        Self {
            id: Set(m.id),
            chat_id: Set(m.chat_id),
            author_id: Set(m.author_id),
            content: Set(m.content),
            is_read: Set(m.read),
            created_at: Set(m.created_at),
        }
    }
}
