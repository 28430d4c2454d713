use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::contract::model::{Chat, InboxEntry, Message};

/// REST DTO for a chat between two users
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatDto {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// REST DTO for a single message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct MessageDto {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

/// REST DTO for one inbox row
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InboxEntryDto {
    pub chat: ChatDto,
    pub peer_id: Uuid,
    pub last_message: Option<MessageDto>,
    pub unread: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OpenChatReq {
    /// The other participant.
    pub peer_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendMessageReq {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MarkReadDto {
    /// Messages flipped to read by this call.
    pub marked: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnreadTotalDto {
    pub total: u64,
}

/// Frame pushed to subscribers over WebSocket and SSE.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerFrame {
    MessageCreated {
        chat_id: Uuid,
        message: MessageDto,
    },
    MessagesRead {
        chat_id: Uuid,
        reader_id: Uuid,
        count: u64,
        at: DateTime<Utc>,
    },
    Typing {
        chat_id: Uuid,
        user_id: Uuid,
        is_typing: bool,
    },
    Error {
        message: String,
    },
}

impl ServerFrame {
    /// SSE `event:` name, same as the `kind` tag.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::MessageCreated { .. } => "message_created",
            Self::MessagesRead { .. } => "messages_read",
            Self::Typing { .. } => "typing",
            Self::Error { .. } => "error",
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Frame accepted from WebSocket clients.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientFrame {
    SendMessage { content: String },
    MarkRead,
    Typing { is_typing: bool },
}

impl ClientFrame {
    pub fn parse(raw: &str) -> Result<Self, String> {
        serde_json::from_str(raw).map_err(|e| format!("invalid frame: {e}"))
    }
}

// Conversion implementations between REST DTOs and contract models

impl From<Chat> for ChatDto {
    fn from(chat: Chat) -> Self {
        Self {
            id: chat.id,
            sender_id: chat.sender_id,
            receiver_id: chat.receiver_id,
            created_at: chat.created_at,
        }
    }
}

impl From<Message> for MessageDto {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            chat_id: message.chat_id,
            author_id: message.author_id,
            content: message.content,
            created_at: message.created_at,
            read: message.read,
        }
    }
}

impl From<InboxEntry> for InboxEntryDto {
    fn from(entry: InboxEntry) -> Self {
        Self {
            chat: entry.chat.into(),
            peer_id: entry.peer_id,
            last_message: entry.last_message.map(Into::into),
            unread: entry.unread,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_frames_parse_by_kind() {
        assert_eq!(
            ClientFrame::parse(r#"{"kind":"send_message","content":"hi"}"#).unwrap(),
            ClientFrame::SendMessage {
                content: "hi".into()
            }
        );
        assert_eq!(
            ClientFrame::parse(r#"{"kind":"mark_read"}"#).unwrap(),
            ClientFrame::MarkRead
        );
        assert_eq!(
            ClientFrame::parse(r#"{"kind":"typing","is_typing":true}"#).unwrap(),
            ClientFrame::Typing { is_typing: true }
        );
    }

    #[test]
    fn unknown_or_malformed_client_frames_are_rejected() {
        assert!(ClientFrame::parse(r#"{"kind":"delete_chat"}"#).is_err());
        assert!(ClientFrame::parse(r#"{"kind":"typing"}"#).is_err());
        assert!(ClientFrame::parse("not json").is_err());
        assert!(ClientFrame::parse(r#"{"content":"no kind"}"#).is_err());
    }

    #[test]
    fn server_frame_is_tagged_with_kind() {
        let chat_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let frame = ServerFrame::Typing {
            chat_id,
            user_id,
            is_typing: false,
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["kind"], "typing");
        assert_eq!(json["is_typing"], false);
        assert_eq!(frame.event_name(), "typing");
        assert_eq!(ServerFrame::error("x").event_name(), "error");
    }
}
