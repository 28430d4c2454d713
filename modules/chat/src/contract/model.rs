use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Conversation between exactly two users.
///
/// `sender_id` / `receiver_id` keep creation order only; neither side is special.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }

    /// The other participant, or `None` when `user_id` is not in the chat.
    pub fn counterpart(&self, user_id: Uuid) -> Option<Uuid> {
        if self.sender_id == user_id {
            Some(self.receiver_id)
        } else if self.receiver_id == user_id {
            Some(self.sender_id)
        } else {
            None
        }
    }
}

/// Immutable chat entry; only `read` ever changes (false → true).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

/// Result of find-or-create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedChat {
    pub chat: Chat,
    pub created: bool,
}

/// One row of a user's inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxEntry {
    pub chat: Chat,
    pub peer_id: Uuid,
    pub last_message: Option<Message>,
    /// Messages from the peer the user has not read yet.
    pub unread: u64,
}

impl InboxEntry {
    /// Time of the last message, or chat creation when empty.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_message
            .as_ref()
            .map_or(self.chat.created_at, |m| m.created_at)
    }
}
