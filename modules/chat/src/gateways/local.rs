use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::ChatApi,
    error::ChatError,
    model::{Chat, InboxEntry, Message},
};
use crate::domain::service::Service;

/// Local implementation of the ChatApi trait that delegates to the domain service
pub struct ChatLocalClient {
    service: Arc<Service>,
}

impl ChatLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ChatApi for ChatLocalClient {
    async fn send_message(
        &self,
        chat_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> Result<Message, ChatError> {
        self.service
            .send_message(chat_id, author_id, content)
            .await
            .map_err(ChatError::from)
    }

    async fn list_messages(
        &self,
        chat_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Message>, ChatError> {
        self.service
            .list_messages(chat_id, user_id)
            .await
            .map_err(ChatError::from)
    }

    async fn mark_read(&self, chat_id: Uuid, reader_id: Uuid) -> Result<u64, ChatError> {
        self.service
            .mark_read(chat_id, reader_id)
            .await
            .map_err(ChatError::from)
    }

    async fn get_or_create_chat(&self, user_a: Uuid, user_b: Uuid) -> Result<Chat, ChatError> {
        self.service
            .get_or_create_chat(user_a, user_b)
            .await
            .map(|opened| opened.chat)
            .map_err(ChatError::from)
    }

    async fn list_chats_for_user(&self, user_id: Uuid) -> Result<Vec<InboxEntry>, ChatError> {
        self.service
            .list_chats_for_user(user_id)
            .await
            .map_err(ChatError::from)
    }

    async fn get_chat(&self, chat_id: Uuid, user_id: Uuid) -> Result<Chat, ChatError> {
        self.service
            .get_chat(chat_id, user_id)
            .await
            .map_err(ChatError::from)
    }

    async fn unread_total(&self, user_id: Uuid) -> Result<u64, ChatError> {
        self.service
            .unread_total(user_id)
            .await
            .map_err(ChatError::from)
    }
}
