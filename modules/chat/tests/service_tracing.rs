//! Service methods run inside `chat.service.*` spans.

mod common;

use std::sync::Arc;

use tracing_test::traced_test;
use uuid::Uuid;

use chat::api::rest::dto::ServerFrame;
use chat::api::rest::relay::Relay;
use chat::contract::{client::ChatApi, error::ChatError};
use chat::domain::ports::NoopPublisher;
use chat::domain::service::{Service, ServiceConfig};
use chat::gateways::local::ChatLocalClient;
use chat::infra::realtime::ChatHub;

use common::mock::MockChatsRepository;

fn service() -> Service {
    Service::new(
        Arc::new(MockChatsRepository::default()),
        Arc::new(NoopPublisher),
        ServiceConfig::default(),
    )
}

#[traced_test]
#[tokio::test]
async fn chat_creation_and_send_emit_spans() {
    let service = service();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

    let chat = service.get_or_create_chat(a, b).await.unwrap().chat;
    service
        .send_message(chat.id, a, "hello".into())
        .await
        .unwrap();

    assert!(logs_contain("chat.service.get_or_create_chat"));
    assert!(logs_contain("chat.service.send_message"));
    assert!(logs_contain("Message sent"));
}

#[traced_test]
#[tokio::test]
async fn read_side_emits_spans() {
    let service = service();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let chat = service.get_or_create_chat(a, b).await.unwrap().chat;

    service.list_messages(chat.id, b).await.unwrap();
    service.mark_read(chat.id, b).await.unwrap();
    service.list_chats_for_user(a).await.unwrap();

    assert!(logs_contain("chat.service.list_messages"));
    assert!(logs_contain("chat.service.mark_read"));
    assert!(logs_contain("chat.service.list_chats_for_user"));
}

fn failing_service() -> Arc<Service> {
    Arc::new(Service::new(
        Arc::new(MockChatsRepository::failing()),
        Arc::new(NoopPublisher),
        ServiceConfig::default(),
    ))
}

#[traced_test]
#[tokio::test]
async fn repository_failure_is_logged_for_local_clients() {
    let client = ChatLocalClient::new(failing_service());

    let err = client
        .list_messages(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();

    assert_eq!(err, ChatError::Internal);
    assert!(logs_contain("Repository call failed"));
    assert!(logs_contain("connection refused"));
}

#[traced_test]
#[tokio::test]
async fn repository_failure_is_logged_for_socket_frames() {
    let hub = ChatHub::<ServerFrame>::new(4);
    let subscription = hub.subscribe(Uuid::new_v4());
    let relay = Relay::new(failing_service(), hub.clone(), &subscription, Uuid::new_v4());

    let reply = relay
        .handle_text(r#"{"kind":"send_message","content":"hi"}"#)
        .await;

    assert_eq!(reply, Some(ServerFrame::error("Internal error")));
    assert!(logs_contain("chat.service.send_message"));
    assert!(logs_contain("connection refused"));
}
