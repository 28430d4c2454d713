//! Per-connection frame relay.
//!
//! [`Relay`] interprets client frames independently of the transport;
//! [`serve_socket`] drives one WebSocket connection through it.

use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::rest::dto::{ClientFrame, ServerFrame};
use crate::contract::error::ChatError;
use crate::domain::service::Service;
use crate::infra::realtime::{ChatHub, Subscription};

pub struct Relay {
    service: Arc<Service>,
    hub: Arc<ChatHub<ServerFrame>>,
    chat_id: Uuid,
    user_id: Uuid,
    connection_id: u64,
}

impl Relay {
    /// Bind a relay to the connection that owns `subscription`.
    pub fn new(
        service: Arc<Service>,
        hub: Arc<ChatHub<ServerFrame>>,
        subscription: &Subscription<ServerFrame>,
        user_id: Uuid,
    ) -> Self {
        Self {
            service,
            hub,
            chat_id: subscription.chat_id(),
            user_id,
            connection_id: subscription.id(),
        }
    }

    /// Handle one inbound text frame.
    ///
    /// Returns a frame meant for this connection only (an error), if any.
    /// Successful sends and reads reach every subscriber through the service events.
    pub async fn handle_text(&self, raw: &str) -> Option<ServerFrame> {
        let frame = match ClientFrame::parse(raw) {
            Ok(frame) => frame,
            Err(message) => {
                debug!(chat_id = %self.chat_id, %message, "Rejected client frame");
                return Some(ServerFrame::error(message));
            }
        };

        match frame {
            ClientFrame::SendMessage { content } => self
                .service
                .send_message(self.chat_id, self.user_id, content)
                .await
                .err()
                .map(|e| ServerFrame::error(ChatError::from(e).to_string())),
            ClientFrame::MarkRead => self
                .service
                .mark_read(self.chat_id, self.user_id)
                .await
                .err()
                .map(|e| ServerFrame::error(ChatError::from(e).to_string())),
            ClientFrame::Typing { is_typing } => {
                self.hub.publish_except(
                    self.chat_id,
                    self.connection_id,
                    ServerFrame::Typing {
                        chat_id: self.chat_id,
                        user_id: self.user_id,
                        is_typing,
                    },
                );
                None
            }
        }
    }
}

/// Pump frames between the socket and the chat until either side closes.
pub async fn serve_socket(
    socket: WebSocket,
    relay: Relay,
    mut subscription: Subscription<ServerFrame>,
) {
    let (mut sink, mut stream) = socket.split();
    debug!(chat_id = %relay.chat_id, connection = relay.connection_id, "WebSocket opened");

    loop {
        tokio::select! {
            pushed = subscription.recv() => {
                let Some(frame) = pushed else { break };
                if send_frame(&mut sink, &frame).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                let reply = match incoming {
                    Some(Ok(WsMessage::Text(text))) => relay.handle_text(text.as_str()).await,
                    Some(Ok(WsMessage::Binary(_))) => {
                        Some(ServerFrame::error("binary frames are not supported"))
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => None,
                    Some(Err(e)) => {
                        debug!(error = %e, "WebSocket receive failed");
                        break;
                    }
                };
                if let Some(frame) = reply {
                    if send_frame(&mut sink, &frame).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    debug!(chat_id = %relay.chat_id, connection = relay.connection_id, "WebSocket closed");
}

async fn send_frame<S>(sink: &mut S, frame: &ServerFrame) -> Result<(), ()>
where
    S: futures::Sink<WsMessage> + Unpin,
    S::Error: std::fmt::Display,
{
    let json = match serde_json::to_string(frame) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "Failed to encode frame");
            return Ok(());
        }
    };
    sink.send(WsMessage::Text(json.into())).await.map_err(|e| {
        debug!(error = %e, "WebSocket send failed");
    })
}
