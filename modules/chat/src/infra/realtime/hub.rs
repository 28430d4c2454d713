//! Per-chat subscription hub.
//!
//! The hub keeps only weak senders; each [`Subscription`] owns its channel and
//! unregisters itself on drop, so a connection's lifetime belongs to the task
//! that holds the subscription. Publishing never awaits: a subscriber whose
//! queue is full misses that frame.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use futures::Stream;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use uuid::Uuid;

struct Subscriber<T> {
    id: u64,
    tx: mpsc::WeakSender<T>,
}

pub struct ChatHub<T> {
    chats: DashMap<Uuid, Vec<Subscriber<T>>>,
    buffer: usize,
    next_id: AtomicU64,
}

impl<T: Clone + Send + 'static> ChatHub<T> {
    /// `buffer` is the per-subscriber queue length.
    pub fn new(buffer: usize) -> Arc<Self> {
        Arc::new(Self {
            chats: DashMap::new(),
            buffer: buffer.max(1),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn subscribe(self: &Arc<Self>, chat_id: Uuid) -> Subscription<T> {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.chats.entry(chat_id).or_default().push(Subscriber {
            id,
            tx: tx.downgrade(),
        });
        tracing::debug!(%chat_id, subscriber = id, "Subscribed to chat");
        Subscription {
            id,
            chat_id,
            rx,
            _tx: tx,
            hub: Arc::downgrade(self),
        }
    }

    /// Fan out to every subscriber of the chat; returns how many got the frame.
    pub fn publish(&self, chat_id: Uuid, frame: T) -> usize {
        self.fan_out(chat_id, None, frame)
    }

    /// Fan out to every subscriber except `origin`.
    pub fn publish_except(&self, chat_id: Uuid, origin: u64, frame: T) -> usize {
        self.fan_out(chat_id, Some(origin), frame)
    }

    pub fn subscriber_count(&self, chat_id: Uuid) -> usize {
        self.chats.get(&chat_id).map_or(0, |s| s.len())
    }

    fn fan_out(&self, chat_id: Uuid, skip: Option<u64>, frame: T) -> usize {
        let Some(mut subs) = self.chats.get_mut(&chat_id) else {
            return 0;
        };
        let mut delivered = 0;
        subs.retain(|sub| {
            if Some(sub.id) == skip {
                return true;
            }
            let Some(tx) = sub.tx.upgrade() else {
                return false;
            };
            match tx.try_send(frame.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(%chat_id, subscriber = sub.id, "Subscriber queue full, frame dropped");
                    true
                }
                Err(TrySendError::Closed(_)) => false,
            }
        });
        let empty = subs.is_empty();
        drop(subs);
        if empty {
            self.chats.remove_if(&chat_id, |_, s| s.is_empty());
        }
        delivered
    }

    fn unsubscribe(&self, chat_id: Uuid, id: u64) {
        if let Some(mut subs) = self.chats.get_mut(&chat_id) {
            subs.retain(|s| s.id != id);
        }
        self.chats.remove_if(&chat_id, |_, s| s.is_empty());
        tracing::debug!(%chat_id, subscriber = id, "Unsubscribed from chat");
    }
}

/// Receiving end of one connection's subscription.
pub struct Subscription<T: Clone + Send + 'static> {
    id: u64,
    chat_id: Uuid,
    rx: mpsc::Receiver<T>,
    // Keeps the channel open while the subscription lives.
    _tx: mpsc::Sender<T>,
    hub: Weak<ChatHub<T>>,
}

impl<T: Clone + Send + 'static> Subscription<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn chat_id(&self) -> Uuid {
        self.chat_id
    }

    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Next queued frame without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Frames as a stream; the subscription ends when the stream is dropped.
    pub fn into_stream(self) -> impl Stream<Item = T> + Send + 'static {
        futures::stream::unfold(self, |mut sub| async move {
            let frame = sub.recv().await?;
            Some((frame, sub))
        })
    }
}

impl<T: Clone + Send + 'static> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(self.chat_id, self.id);
        }
    }
}
