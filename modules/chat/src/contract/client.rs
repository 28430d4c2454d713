use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    error::ChatError,
    model::{Chat, InboxEntry, Message},
};

/// Public API of the chat module for in-process consumers.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Append a message authored by a participant.
    async fn send_message(
        &self,
        chat_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> Result<Message, ChatError>;

    /// All messages of the chat, oldest first.
    async fn list_messages(&self, chat_id: Uuid, user_id: Uuid)
        -> Result<Vec<Message>, ChatError>;

    /// Mark the peer's messages as read; returns how many flipped.
    async fn mark_read(&self, chat_id: Uuid, reader_id: Uuid) -> Result<u64, ChatError>;

    /// The single chat between two users, created on first contact.
    async fn get_or_create_chat(&self, user_a: Uuid, user_b: Uuid) -> Result<Chat, ChatError>;

    /// Inbox, most recent activity first.
    async fn list_chats_for_user(&self, user_id: Uuid) -> Result<Vec<InboxEntry>, ChatError>;

    async fn get_chat(&self, chat_id: Uuid, user_id: Uuid) -> Result<Chat, ChatError>;

    /// Unread messages across every chat of the user.
    async fn unread_total(&self, user_id: Uuid) -> Result<u64, ChatError>;
}
