use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use modkit::api::OpenApiRegistry;
use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};
use crate::config::ChatConfig;
use crate::domain::service::Service;
use crate::infra::realtime::ChatHub;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_chats,
        handlers::open_chat,
        handlers::unread_total,
        handlers::get_chat,
        handlers::list_messages,
        handlers::send_message,
        handlers::mark_read,
        handlers::chat_events,
        handlers::chat_socket,
    ),
    components(schemas(
        dto::ChatDto,
        dto::MessageDto,
        dto::InboxEntryDto,
        dto::OpenChatReq,
        dto::SendMessageReq,
        dto::MarkReadDto,
        dto::UnreadTotalDto,
        dto::ServerFrame,
        dto::ClientFrame,
        modkit::Problem,
    )),
    tags(
        (name = "chats", description = "Chat directory"),
        (name = "messages", description = "Messages of a chat"),
        (name = "realtime", description = "Live chat frames over SSE and WebSocket"),
    )
)]
struct ChatApiDoc;

pub fn register_routes(
    router: Router,
    openapi: &OpenApiRegistry,
    service: Arc<Service>,
    hub: Arc<ChatHub<dto::ServerFrame>>,
    config: Arc<ChatConfig>,
) -> anyhow::Result<Router> {
    let chat_routes = Router::new()
        .route("/chats", get(handlers::list_chats).post(handlers::open_chat))
        .route("/chats/unread", get(handlers::unread_total))
        .route("/chats/{id}", get(handlers::get_chat))
        .route(
            "/chats/{id}/messages",
            get(handlers::list_messages).post(handlers::send_message),
        )
        .route("/chats/{id}/read", post(handlers::mark_read))
        .route("/chats/{id}/events", get(handlers::chat_events))
        .route("/chats/{id}/ws", get(handlers::chat_socket))
        .layer(Extension(service))
        .layer(Extension(hub))
        .layer(Extension(config));

    openapi.register(ChatApiDoc::openapi());
    tracing::debug!("Registered chat routes");
    Ok(router.merge(chat_routes))
}
