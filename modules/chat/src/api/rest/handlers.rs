use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ws::WebSocketUpgrade, Path},
    http::{StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    Extension,
};
use modkit::{typed_sse, Caller, Problem, ProblemResponse};
use tracing::info;
use uuid::Uuid;

use crate::api::rest::dto::{
    ChatDto, InboxEntryDto, MarkReadDto, MessageDto, OpenChatReq, SendMessageReq, ServerFrame,
    UnreadTotalDto,
};
use crate::api::rest::error::map_domain_error;
use crate::api::rest::relay::{serve_socket, Relay};
use crate::config::ChatConfig;
use crate::domain::service::Service;
use crate::infra::realtime::ChatHub;

type ApiResult<T> = Result<T, ProblemResponse>;

/// Inbox of the caller, most recent activity first
#[utoipa::path(
    get,
    path = "/chats",
    tag = "chats",
    params(("x-user-id" = Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 200, description = "Inbox entries", body = Vec<InboxEntryDto>),
        (status = 401, description = "Missing identity", body = Problem),
    )
)]
pub async fn list_chats(
    Extension(svc): Extension<Arc<Service>>,
    Caller(user_id): Caller,
    uri: Uri,
) -> ApiResult<Json<Vec<InboxEntryDto>>> {
    let inbox = svc
        .list_chats_for_user(user_id)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok(Json(inbox.into_iter().map(InboxEntryDto::from).collect()))
}

/// Open the chat with a peer, creating it on first contact
#[utoipa::path(
    post,
    path = "/chats",
    tag = "chats",
    params(("x-user-id" = Uuid, Header, description = "Authenticated user")),
    request_body = OpenChatReq,
    responses(
        (status = 201, description = "Chat created", body = ChatDto),
        (status = 200, description = "Existing chat", body = ChatDto),
        (status = 400, description = "Chat with yourself", body = Problem),
        (status = 401, description = "Missing identity", body = Problem),
    )
)]
pub async fn open_chat(
    Extension(svc): Extension<Arc<Service>>,
    Caller(user_id): Caller,
    uri: Uri,
    Json(req): Json<OpenChatReq>,
) -> ApiResult<(StatusCode, Json<ChatDto>)> {
    let opened = svc
        .get_or_create_chat(user_id, req.peer_id)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    let status = if opened.created {
        info!(chat_id = %opened.chat.id, "Opened new chat");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(opened.chat.into())))
}

/// Unread messages across all chats of the caller
#[utoipa::path(
    get,
    path = "/chats/unread",
    tag = "chats",
    params(("x-user-id" = Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 200, description = "Unread total", body = UnreadTotalDto),
        (status = 401, description = "Missing identity", body = Problem),
    )
)]
pub async fn unread_total(
    Extension(svc): Extension<Arc<Service>>,
    Caller(user_id): Caller,
    uri: Uri,
) -> ApiResult<Json<UnreadTotalDto>> {
    let total = svc
        .unread_total(user_id)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok(Json(UnreadTotalDto { total }))
}

#[utoipa::path(
    get,
    path = "/chats/{id}",
    tag = "chats",
    params(
        ("id" = Uuid, Path, description = "Chat id"),
        ("x-user-id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Chat", body = ChatDto),
        (status = 403, description = "Not a participant", body = Problem),
        (status = 404, description = "Chat not found", body = Problem),
    )
)]
pub async fn get_chat(
    Extension(svc): Extension<Arc<Service>>,
    Caller(user_id): Caller,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> ApiResult<Json<ChatDto>> {
    let chat = svc
        .get_chat(id, user_id)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok(Json(chat.into()))
}

/// Messages of a chat, oldest first
#[utoipa::path(
    get,
    path = "/chats/{id}/messages",
    tag = "messages",
    params(
        ("id" = Uuid, Path, description = "Chat id"),
        ("x-user-id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Messages", body = Vec<MessageDto>),
        (status = 403, description = "Not a participant", body = Problem),
        (status = 404, description = "Chat not found", body = Problem),
    )
)]
pub async fn list_messages(
    Extension(svc): Extension<Arc<Service>>,
    Caller(user_id): Caller,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> ApiResult<Json<Vec<MessageDto>>> {
    let messages = svc
        .list_messages(id, user_id)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok(Json(messages.into_iter().map(MessageDto::from).collect()))
}

#[utoipa::path(
    post,
    path = "/chats/{id}/messages",
    tag = "messages",
    params(
        ("id" = Uuid, Path, description = "Chat id"),
        ("x-user-id" = Uuid, Header, description = "Authenticated user"),
    ),
    request_body = SendMessageReq,
    responses(
        (status = 201, description = "Message stored", body = MessageDto),
        (status = 400, description = "Empty or too long", body = Problem),
        (status = 403, description = "Not a participant", body = Problem),
        (status = 404, description = "Chat not found", body = Problem),
    )
)]
pub async fn send_message(
    Extension(svc): Extension<Arc<Service>>,
    Caller(user_id): Caller,
    Path(id): Path<Uuid>,
    uri: Uri,
    Json(req): Json<SendMessageReq>,
) -> ApiResult<(StatusCode, Json<MessageDto>)> {
    let message = svc
        .send_message(id, user_id, req.content)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok((StatusCode::CREATED, Json(message.into())))
}

/// Mark the peer's messages as read
#[utoipa::path(
    post,
    path = "/chats/{id}/read",
    tag = "messages",
    params(
        ("id" = Uuid, Path, description = "Chat id"),
        ("x-user-id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Number of messages marked", body = MarkReadDto),
        (status = 403, description = "Not a participant", body = Problem),
        (status = 404, description = "Chat not found", body = Problem),
    )
)]
pub async fn mark_read(
    Extension(svc): Extension<Arc<Service>>,
    Caller(user_id): Caller,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> ApiResult<Json<MarkReadDto>> {
    let marked = svc
        .mark_read(id, user_id)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok(Json(MarkReadDto { marked }))
}

/// Server-sent stream of chat frames
#[utoipa::path(
    get,
    path = "/chats/{id}/events",
    tag = "realtime",
    params(
        ("id" = Uuid, Path, description = "Chat id"),
        ("x-user-id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream", body = ServerFrame),
        (status = 403, description = "Not a participant", body = Problem),
        (status = 404, description = "Chat not found", body = Problem),
    )
)]
pub async fn chat_events(
    Extension(svc): Extension<Arc<Service>>,
    Extension(hub): Extension<Arc<ChatHub<ServerFrame>>>,
    Extension(cfg): Extension<Arc<ChatConfig>>,
    Caller(user_id): Caller,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> ApiResult<Response> {
    svc.get_chat(id, user_id)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;

    let frames = hub.subscribe(id).into_stream();
    let keepalive = Duration::from_secs(cfg.sse_keepalive_secs.max(1));
    Ok(typed_sse(frames, keepalive, ServerFrame::event_name).into_response())
}

/// Bidirectional chat socket
#[utoipa::path(
    get,
    path = "/chats/{id}/ws",
    tag = "realtime",
    params(
        ("id" = Uuid, Path, description = "Chat id"),
        ("x-user-id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 101, description = "Switching to WebSocket"),
        (status = 403, description = "Not a participant", body = Problem),
        (status = 404, description = "Chat not found", body = Problem),
    )
)]
pub async fn chat_socket(
    Extension(svc): Extension<Arc<Service>>,
    Extension(hub): Extension<Arc<ChatHub<ServerFrame>>>,
    Caller(user_id): Caller,
    Path(id): Path<Uuid>,
    uri: Uri,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    svc.get_chat(id, user_id)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;

    let subscription = hub.subscribe(id);
    let relay = Relay::new(svc, hub, &subscription, user_id);
    Ok(ws.on_upgrade(move |socket| serve_socket(socket, relay, subscription)))
}
