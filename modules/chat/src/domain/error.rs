use thiserror::Error;
use uuid::Uuid;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Chat not found: {id}")]
    ChatNotFound { id: Uuid },

    #[error("User {user_id} is not a participant of chat {chat_id}")]
    NotParticipant { chat_id: Uuid, user_id: Uuid },

    #[error("Cannot open a chat with yourself ({user_id})")]
    SelfChat { user_id: Uuid },

    #[error("Message too long: {len} characters (max: {max})")]
    ContentTooLong { len: usize, max: usize },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn chat_not_found(id: Uuid) -> Self {
        Self::ChatNotFound { id }
    }

    pub fn not_participant(chat_id: Uuid, user_id: Uuid) -> Self {
        Self::NotParticipant { chat_id, user_id }
    }

    pub fn self_chat(user_id: Uuid) -> Self {
        Self::SelfChat { user_id }
    }

    pub fn content_too_long(len: usize, max: usize) -> Self {
        Self::ContentTooLong { len, max }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}
