//! Polling follower for clients without a live connection.
//!
//! Re-reads the whole message list every `interval` and publishes it only when
//! it differs from the last snapshot. Errors are logged and retried on the next
//! tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::contract::{client::ChatApi, model::Message};

pub struct ChatPoller {
    api: Arc<dyn ChatApi>,
    chat_id: Uuid,
    user_id: Uuid,
    interval: Duration,
}

impl ChatPoller {
    pub fn new(api: Arc<dyn ChatApi>, chat_id: Uuid, user_id: Uuid, interval: Duration) -> Self {
        Self {
            api,
            chat_id,
            user_id,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// Start polling until `cancel` fires or the handle is dropped.
    /// The first poll happens one interval from now.
    pub fn spawn(self, cancel: CancellationToken) -> PollerHandle {
        let (tx, rx) = watch::channel(Vec::new());
        let token = cancel.child_token();
        let task = tokio::spawn({
            let token = token.clone();
            async move { self.run(tx, token).await }
        });
        PollerHandle {
            rx,
            task,
            guard: token.drop_guard(),
        }
    }

    async fn run(self, tx: watch::Sender<Vec<Message>>, cancel: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(chat_id = %self.chat_id, interval_ms = self.interval.as_millis() as u64, "Poller started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.api.list_messages(self.chat_id, self.user_id).await {
                Ok(messages) => {
                    let changed = tx.send_if_modified(|current| {
                        if *current == messages {
                            false
                        } else {
                            *current = messages;
                            true
                        }
                    });
                    if changed {
                        debug!(chat_id = %self.chat_id, "Poll found changes");
                    }
                }
                Err(e) => warn!(chat_id = %self.chat_id, error = %e, "Poll failed, retrying next tick"),
            }
        }

        debug!(chat_id = %self.chat_id, "Poller stopped");
    }
}

/// Handle to a running poller. Dropping it stops the loop.
pub struct PollerHandle {
    rx: watch::Receiver<Vec<Message>>,
    task: JoinHandle<()>,
    guard: DropGuard,
}

impl PollerHandle {
    /// Latest published snapshot.
    pub fn latest(&self) -> Vec<Message> {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Message>> {
        self.rx.clone()
    }

    /// Snapshots as a stream, starting with the current one.
    pub fn stream(&self) -> WatchStream<Vec<Message>> {
        WatchStream::new(self.rx.clone())
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel and wait for the loop to exit.
    pub async fn stop(self) {
        let PollerHandle { task, guard, .. } = self;
        guard.disarm().cancel();
        if let Err(e) = task.await {
            warn!(error = %e, "Poller task ended abnormally");
        }
    }
}
