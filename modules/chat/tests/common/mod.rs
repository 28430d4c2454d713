#![allow(dead_code)]

pub mod mock;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use modkit::api::OpenApiRegistry;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use chat::{
    api::rest::{dto::ServerFrame, hub_adapter::HubEventPublisher, routes},
    config::ChatConfig,
    domain::service::{Service, ServiceConfig},
    infra::{
        realtime::ChatHub,
        storage::{migrations::Migrator, sea_orm_repo::SeaOrmChatsRepository},
    },
};

/// Fresh in-memory SQLite DB with migrations applied.
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub struct TestApp {
    pub service: Arc<Service>,
    pub hub: Arc<ChatHub<ServerFrame>>,
    pub router: Router,
}

/// Service wired to a SeaORM repo and a live hub, plus the REST router.
pub async fn create_test_app() -> TestApp {
    let db = create_test_db().await;
    let hub = ChatHub::new(16);
    let service = Arc::new(Service::new(
        Arc::new(SeaOrmChatsRepository::new(db)),
        Arc::new(HubEventPublisher::new(hub.clone())),
        ServiceConfig::default(),
    ));
    let router = routes::register_routes(
        Router::new(),
        &OpenApiRegistry::default(),
        service.clone(),
        hub.clone(),
        Arc::new(ChatConfig::default()),
    )
    .expect("routes");
    TestApp {
        service,
        hub,
        router,
    }
}

pub fn get(uri: &str, user: Uuid) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-user-id", user.to_string())
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, user: Uuid, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-user-id", user.to_string())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_empty(uri: &str, user: Uuid) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-user-id", user.to_string())
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
