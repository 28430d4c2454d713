//! Polling follower under paused tokio time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use chat::contract::{
    client::ChatApi,
    error::ChatError,
    model::{Chat, InboxEntry, Message},
};
use chat::gateways::poller::ChatPoller;

/// Serves a fixed message list and counts `list_messages` calls.
struct ScriptedApi {
    calls: AtomicUsize,
    messages: Mutex<Vec<Message>>,
    fail_on_call: Option<usize>,
}

impl ScriptedApi {
    fn new(messages: Vec<Message>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            messages: Mutex::new(messages),
            fail_on_call: None,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn message(chat_id: Uuid, content: &str) -> Message {
    Message {
        id: Uuid::now_v7(),
        chat_id,
        author_id: Uuid::new_v4(),
        content: content.to_string(),
        created_at: Utc::now(),
        read: false,
    }
}

#[async_trait]
impl ChatApi for ScriptedApi {
    async fn send_message(&self, _: Uuid, _: Uuid, _: String) -> Result<Message, ChatError> {
        Err(ChatError::internal())
    }

    async fn list_messages(&self, _: Uuid, _: Uuid) -> Result<Vec<Message>, ChatError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(n) {
            return Err(ChatError::internal());
        }
        Ok(self.messages.lock().unwrap().clone())
    }

    async fn mark_read(&self, _: Uuid, _: Uuid) -> Result<u64, ChatError> {
        Ok(0)
    }

    async fn get_or_create_chat(&self, _: Uuid, _: Uuid) -> Result<Chat, ChatError> {
        Err(ChatError::internal())
    }

    async fn list_chats_for_user(&self, _: Uuid) -> Result<Vec<InboxEntry>, ChatError> {
        Ok(Vec::new())
    }

    async fn get_chat(&self, id: Uuid, _: Uuid) -> Result<Chat, ChatError> {
        Err(ChatError::not_found(id))
    }

    async fn unread_total(&self, _: Uuid) -> Result<u64, ChatError> {
        Ok(0)
    }
}

/// Count published snapshots on a separate task.
fn count_changes(mut rx: tokio::sync::watch::Receiver<Vec<Message>>) -> Arc<AtomicUsize> {
    let changes = Arc::new(AtomicUsize::new(0));
    let counter = changes.clone();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });
    changes
}

#[tokio::test(start_paused = true)]
async fn three_ticks_without_news_publish_once() {
    let chat_id = Uuid::new_v4();
    let api = ScriptedApi::new(vec![message(chat_id, "hello")]);
    let poller = ChatPoller::new(
        api.clone(),
        chat_id,
        Uuid::new_v4(),
        Duration::from_secs(3),
    );
    let handle = poller.spawn(CancellationToken::new());
    let changes = count_changes(handle.subscribe());

    tokio::time::sleep(Duration::from_millis(9_500)).await;

    assert_eq!(api.calls(), 3);
    assert_eq!(changes.load(Ordering::SeqCst), 1);
    assert_eq!(handle.latest().len(), 1);
    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn new_message_is_picked_up_on_next_tick() {
    let chat_id = Uuid::new_v4();
    let api = ScriptedApi::new(Vec::new());
    let handle = ChatPoller::new(api.clone(), chat_id, Uuid::new_v4(), Duration::from_secs(3))
        .spawn(CancellationToken::new());
    let mut snapshots = handle.stream();

    // Current (empty) snapshot first.
    assert_eq!(snapshots.next().await, Some(Vec::new()));

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(api.calls(), 1);
    api.messages.lock().unwrap().push(message(chat_id, "news"));

    let next = snapshots.next().await.unwrap();
    assert_eq!(next.len(), 1);
    assert_eq!(next[0].content, "news");
    assert_eq!(api.calls(), 2);
    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn failed_poll_is_retried_next_tick() {
    let chat_id = Uuid::new_v4();
    let api = Arc::new(ScriptedApi {
        calls: AtomicUsize::new(0),
        messages: Mutex::new(vec![message(chat_id, "hello")]),
        fail_on_call: Some(1),
    });
    let handle = ChatPoller::new(api.clone(), chat_id, Uuid::new_v4(), Duration::from_secs(3))
        .spawn(CancellationToken::new());

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(api.calls(), 1);
    assert!(handle.latest().is_empty());

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(api.calls(), 2);
    assert_eq!(handle.latest().len(), 1);
    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_polling() {
    let chat_id = Uuid::new_v4();
    let api = ScriptedApi::new(Vec::new());
    let cancel = CancellationToken::new();
    let handle = ChatPoller::new(api.clone(), chat_id, Uuid::new_v4(), Duration::from_secs(3))
        .spawn(cancel.clone());

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    cancel.cancel();
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(api.calls(), 1);
    assert!(handle.is_finished());
}

#[tokio::test(start_paused = true)]
async fn dropping_handle_stops_polling() {
    let chat_id = Uuid::new_v4();
    let api = ScriptedApi::new(vec![message(chat_id, "hello")]);
    let cancel = CancellationToken::new();
    let handle = ChatPoller::new(api.clone(), chat_id, Uuid::new_v4(), Duration::from_secs(3))
        .spawn(cancel.clone());

    drop(handle);
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(api.calls(), 0);
    // Parent token is untouched.
    assert!(!cancel.is_cancelled());
}
