use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{Chat, InboxEntry, Message, OpenedChat};
use crate::domain::error::DomainError;
use crate::domain::events::ChatDomainEvent;
use crate::domain::ports::EventPublisher;
use crate::domain::repo::{pair_key, ChatInsert, ChatsRepository};

/// Domain service with the messaging rules.
/// Depends only on the repository and event ports, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn ChatsRepository>,
    events: Arc<dyn EventPublisher<ChatDomainEvent>>,
    config: ServiceConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Upper bound on message length, in characters.
    pub max_message_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_message_length: 2000,
        }
    }
}

/// Repository failures are logged here, inside the operation span, so every
/// caller (REST, WebSocket, `ChatApi`) keeps the cause.
fn db(e: anyhow::Error) -> DomainError {
    error!(error = format!("{e:#}"), "Repository call failed");
    DomainError::database(format!("{e:#}"))
}

impl Service {
    pub fn new(
        repo: Arc<dyn ChatsRepository>,
        events: Arc<dyn EventPublisher<ChatDomainEvent>>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repo,
            events,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // --- Message Service ---

    #[instrument(
        name = "chat.service.send_message",
        skip(self, content),
        fields(chat_id = %chat_id, author_id = %author_id, len = content.len())
    )]
    pub async fn send_message(
        &self,
        chat_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> Result<Message, DomainError> {
        self.validate_content(&content)?;
        self.participant_chat(chat_id, author_id).await?;

        let message = Message {
            id: Uuid::now_v7(),
            chat_id,
            author_id,
            content,
            created_at: Utc::now(),
            read: false,
        };
        self.repo
            .insert_message(message.clone())
            .await
            .map_err(db)?;

        self.events.publish(&ChatDomainEvent::MessageCreated {
            message: message.clone(),
        });

        info!(message_id = %message.id, "Message sent");
        Ok(message)
    }

    #[instrument(
        name = "chat.service.list_messages",
        skip(self),
        fields(chat_id = %chat_id, user_id = %user_id)
    )]
    pub async fn list_messages(
        &self,
        chat_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Message>, DomainError> {
        self.participant_chat(chat_id, user_id).await?;
        let messages = self.repo.list_messages(chat_id).await.map_err(db)?;
        debug!(count = messages.len(), "Listed messages");
        Ok(messages)
    }

    /// Idempotent: a second call flips nothing and returns 0.
    #[instrument(
        name = "chat.service.mark_read",
        skip(self),
        fields(chat_id = %chat_id, reader_id = %reader_id)
    )]
    pub async fn mark_read(&self, chat_id: Uuid, reader_id: Uuid) -> Result<u64, DomainError> {
        self.participant_chat(chat_id, reader_id).await?;
        let count = self
            .repo
            .mark_read(chat_id, reader_id)
            .await
            .map_err(db)?;

        if count > 0 {
            self.events.publish(&ChatDomainEvent::MessagesRead {
                chat_id,
                reader_id,
                count,
                at: Utc::now(),
            });
            info!(count, "Messages marked as read");
        } else {
            debug!("Nothing to mark as read");
        }
        Ok(count)
    }

    // --- Chat Directory ---

    #[instrument(
        name = "chat.service.get_or_create_chat",
        skip(self),
        fields(user_a = %user_a, user_b = %user_b)
    )]
    pub async fn get_or_create_chat(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<OpenedChat, DomainError> {
        if user_a == user_b {
            return Err(DomainError::self_chat(user_a));
        }
        let (low, high) = pair_key(user_a, user_b);

        if let Some(chat) = self
            .repo
            .find_chat_by_pair(low, high)
            .await
            .map_err(db)?
        {
            debug!(chat_id = %chat.id, "Found existing chat");
            return Ok(OpenedChat {
                chat,
                created: false,
            });
        }

        let chat = Chat {
            id: Uuid::new_v4(),
            sender_id: user_a,
            receiver_id: user_b,
            created_at: Utc::now(),
        };
        match self.repo.insert_chat(chat.clone()).await.map_err(db)? {
            ChatInsert::Inserted => {
                self.events.publish(&ChatDomainEvent::ChatCreated {
                    chat_id: chat.id,
                    sender_id: chat.sender_id,
                    receiver_id: chat.receiver_id,
                    at: chat.created_at,
                });
                info!(chat_id = %chat.id, "Chat created");
                Ok(OpenedChat {
                    chat,
                    created: true,
                })
            }
            ChatInsert::PairExists => {
                warn!("Concurrent chat creation detected, using the stored chat");
                let chat = self
                    .repo
                    .find_chat_by_pair(low, high)
                    .await
                    .map_err(db)?
                    .ok_or_else(|| db(anyhow::anyhow!("chat pair reported as existing but not found")))?;
                Ok(OpenedChat {
                    chat,
                    created: false,
                })
            }
        }
    }

    #[instrument(name = "chat.service.list_chats_for_user", skip(self), fields(user_id = %user_id))]
    pub async fn list_chats_for_user(&self, user_id: Uuid) -> Result<Vec<InboxEntry>, DomainError> {
        let chats = self
            .repo
            .list_chats_for_user(user_id)
            .await
            .map_err(db)?;

        let chat_ids: Vec<Uuid> = chats.iter().map(|c| c.id).collect();
        let mut last: HashMap<Uuid, Message> = self
            .repo
            .last_messages(&chat_ids)
            .await
            .map_err(db)?
            .into_iter()
            .map(|m| (m.chat_id, m))
            .collect();
        let unread = self
            .repo
            .unread_counts(&chat_ids, user_id)
            .await
            .map_err(db)?;

        let mut inbox: Vec<InboxEntry> = chats
            .into_iter()
            .filter_map(|chat| {
                let peer_id = chat.counterpart(user_id)?;
                Some(InboxEntry {
                    last_message: last.remove(&chat.id),
                    unread: unread.get(&chat.id).copied().unwrap_or(0),
                    chat,
                    peer_id,
                })
            })
            .collect();

        inbox.sort_by(|a, b| {
            b.last_activity()
                .cmp(&a.last_activity())
                .then_with(|| b.chat.id.cmp(&a.chat.id))
        });
        debug!(count = inbox.len(), "Listed inbox");
        Ok(inbox)
    }

    #[instrument(
        name = "chat.service.get_chat",
        skip(self),
        fields(chat_id = %chat_id, user_id = %user_id)
    )]
    pub async fn get_chat(&self, chat_id: Uuid, user_id: Uuid) -> Result<Chat, DomainError> {
        self.participant_chat(chat_id, user_id).await
    }

    #[instrument(name = "chat.service.unread_total", skip(self), fields(user_id = %user_id))]
    pub async fn unread_total(&self, user_id: Uuid) -> Result<u64, DomainError> {
        self.repo.unread_total(user_id).await.map_err(db)
    }

    // --- helpers ---

    /// Load the chat and require `user_id` to be one of its participants.
    async fn participant_chat(&self, chat_id: Uuid, user_id: Uuid) -> Result<Chat, DomainError> {
        let chat = self
            .repo
            .find_chat(chat_id)
            .await
            .map_err(db)?
            .ok_or_else(|| DomainError::chat_not_found(chat_id))?;
        if !chat.is_participant(user_id) {
            return Err(DomainError::not_participant(chat_id, user_id));
        }
        Ok(chat)
    }

    fn validate_content(&self, content: &str) -> Result<(), DomainError> {
        if content.trim().is_empty() {
            return Err(DomainError::validation(
                "content",
                "message content cannot be empty",
            ));
        }
        let len = content.chars().count();
        if len > self.config.max_message_length {
            return Err(DomainError::content_too_long(
                len,
                self.config.max_message_length,
            ));
        }
        Ok(())
    }
}
