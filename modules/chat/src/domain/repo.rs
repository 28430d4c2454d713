use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::{Chat, Message};

/// Outcome of inserting a chat under the unique participant-pair index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatInsert {
    Inserted,
    /// Another chat for the same pair won the race.
    PairExists,
}

/// Order a participant pair so `(a, b)` and `(b, a)` share one key.
pub fn pair_key(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait ChatsRepository: Send + Sync {
    async fn find_chat(&self, id: Uuid) -> anyhow::Result<Option<Chat>>;
    /// Look up by normalized pair, see [`pair_key`].
    async fn find_chat_by_pair(&self, low: Uuid, high: Uuid) -> anyhow::Result<Option<Chat>>;
    async fn insert_chat(&self, chat: Chat) -> anyhow::Result<ChatInsert>;
    /// Chats where the user is either participant.
    async fn list_chats_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Chat>>;

    /// Service computes id/timestamps/validation; repo persists.
    async fn insert_message(&self, m: Message) -> anyhow::Result<()>;
    /// Ascending by (created_at, id).
    async fn list_messages(&self, chat_id: Uuid) -> anyhow::Result<Vec<Message>>;
    /// Latest message of each listed chat; chats without messages are absent.
    async fn last_messages(&self, chat_ids: &[Uuid]) -> anyhow::Result<Vec<Message>>;
    /// Per-chat count of unread messages not authored by `reader_id`.
    /// Chats with nothing unread are absent.
    async fn unread_counts(
        &self,
        chat_ids: &[Uuid],
        reader_id: Uuid,
    ) -> anyhow::Result<HashMap<Uuid, u64>>;
    /// Flip unread messages not authored by `reader_id`; returns rows changed.
    async fn mark_read(&self, chat_id: Uuid, reader_id: Uuid) -> anyhow::Result<u64>;
    /// Unread messages addressed to the user across all chats.
    async fn unread_total(&self, user_id: Uuid) -> anyhow::Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_key_is_order_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(pair_key(a, b), pair_key(b, a));
        let (low, high) = pair_key(a, b);
        assert!(low <= high);
    }
}
