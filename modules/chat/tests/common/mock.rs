use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use chat::contract::model::{Chat, Message};
use chat::domain::events::ChatDomainEvent;
use chat::domain::ports::EventPublisher;
use chat::domain::repo::{pair_key, ChatInsert, ChatsRepository};

/// In-memory repository; `failing()` makes every call error.
#[derive(Default)]
pub struct MockChatsRepository {
    chats: Mutex<Vec<Chat>>,
    messages: Mutex<Vec<Message>>,
    fail: bool,
}

impl MockChatsRepository {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            anyhow::bail!("connection refused");
        }
        Ok(())
    }

    fn unread(m: &Message, chat_id: Uuid, reader_id: Uuid) -> bool {
        m.chat_id == chat_id && m.author_id != reader_id && !m.read
    }
}

#[async_trait]
impl ChatsRepository for MockChatsRepository {
    async fn find_chat(&self, id: Uuid) -> Result<Option<Chat>> {
        self.check()?;
        Ok(self.chats.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn find_chat_by_pair(&self, low: Uuid, high: Uuid) -> Result<Option<Chat>> {
        self.check()?;
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .find(|c| pair_key(c.sender_id, c.receiver_id) == (low, high))
            .cloned())
    }

    async fn insert_chat(&self, chat: Chat) -> Result<ChatInsert> {
        self.check()?;
        let mut chats = self.chats.lock().unwrap();
        let key = pair_key(chat.sender_id, chat.receiver_id);
        if chats
            .iter()
            .any(|c| pair_key(c.sender_id, c.receiver_id) == key)
        {
            return Ok(ChatInsert::PairExists);
        }
        chats.push(chat);
        Ok(ChatInsert::Inserted)
    }

    async fn list_chats_for_user(&self, user_id: Uuid) -> Result<Vec<Chat>> {
        self.check()?;
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.is_participant(user_id))
            .cloned()
            .collect())
    }

    async fn insert_message(&self, m: Message) -> Result<()> {
        self.check()?;
        self.messages.lock().unwrap().push(m);
        Ok(())
    }

    async fn list_messages(&self, chat_id: Uuid) -> Result<Vec<Message>> {
        self.check()?;
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect())
    }

    async fn last_messages(&self, chat_ids: &[Uuid]) -> Result<Vec<Message>> {
        let mut last = Vec::new();
        for id in chat_ids {
            last.extend(self.list_messages(*id).await?.pop());
        }
        Ok(last)
    }

    async fn unread_counts(&self, chat_ids: &[Uuid], reader_id: Uuid) -> Result<HashMap<Uuid, u64>> {
        self.check()?;
        let messages = self.messages.lock().unwrap();
        let mut counts = HashMap::new();
        for id in chat_ids {
            let n = messages
                .iter()
                .filter(|m| Self::unread(m, *id, reader_id))
                .count() as u64;
            if n > 0 {
                counts.insert(*id, n);
            }
        }
        Ok(counts)
    }

    async fn mark_read(&self, chat_id: Uuid, reader_id: Uuid) -> Result<u64> {
        self.check()?;
        let mut changed = 0;
        for m in self.messages.lock().unwrap().iter_mut() {
            if Self::unread(m, chat_id, reader_id) {
                m.read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn unread_total(&self, user_id: Uuid) -> Result<u64> {
        let ids: Vec<Uuid> = self
            .list_chats_for_user(user_id)
            .await?
            .iter()
            .map(|c| c.id)
            .collect();
        Ok(self.unread_counts(&ids, user_id).await?.values().sum())
    }
}

/// Publisher that keeps every event for inspection.
#[derive(Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<ChatDomainEvent>>,
}

impl RecordingPublisher {
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| match e {
                ChatDomainEvent::ChatCreated { .. } => "chat_created",
                ChatDomainEvent::MessageCreated { .. } => "message_created",
                ChatDomainEvent::MessagesRead { .. } => "messages_read",
            })
            .collect()
    }
}

impl EventPublisher<ChatDomainEvent> for RecordingPublisher {
    fn publish(&self, event: &ChatDomainEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
