use std::sync::Arc;
use std::time::Duration;

use arc_swap::{ArcSwap, ArcSwapOption};
use async_trait::async_trait;
use modkit::api::OpenApiRegistry;
use modkit::{DbModule, Module, ModuleCtx, RestfulModule};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::rest::dto::ServerFrame;
use crate::api::rest::hub_adapter::HubEventPublisher;
use crate::api::rest::routes;
use crate::config::ChatConfig;
use crate::contract::client::ChatApi;
use crate::domain::service::Service;
use crate::gateways::local::ChatLocalClient;
use crate::gateways::poller::{ChatPoller, PollerHandle};
use crate::infra::realtime::ChatHub;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::sea_orm_repo::SeaOrmChatsRepository;

pub const MODULE_NAME: &str = "chat";

/// Chat module: message service, chat directory and live delivery.
#[derive(Default)]
pub struct ChatModule {
    service: ArcSwapOption<Service>,
    hub: ArcSwapOption<ChatHub<ServerFrame>>,
    config: ArcSwap<ChatConfig>,
}

impl ChatModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// In-process client; available after `init`.
    pub fn client(&self) -> anyhow::Result<Arc<dyn ChatApi>> {
        let service = self.service()?;
        Ok(Arc::new(ChatLocalClient::new(service)))
    }

    /// Start the polling fallback for one chat with the configured interval.
    pub fn poller(
        &self,
        chat_id: Uuid,
        user_id: Uuid,
        cancel: CancellationToken,
    ) -> anyhow::Result<PollerHandle> {
        let interval = Duration::from_millis(self.config.load().poll_interval_ms);
        Ok(ChatPoller::new(self.client()?, chat_id, user_id, interval).spawn(cancel))
    }

    pub fn config(&self) -> Arc<ChatConfig> {
        self.config.load_full()
    }

    fn service(&self) -> anyhow::Result<Arc<Service>> {
        self.service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))
    }

    fn hub(&self) -> anyhow::Result<Arc<ChatHub<ServerFrame>>> {
        self.hub
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("Hub not initialized"))
    }
}

#[async_trait]
impl Module for ChatModule {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        info!("Initializing chat module");

        let cfg: ChatConfig = ctx.module_config();
        debug!(
            max_message_length = cfg.max_message_length,
            subscriber_buffer = cfg.subscriber_buffer,
            poll_interval_ms = cfg.poll_interval_ms,
            "Loaded chat config"
        );

        let db = ctx.db().ok_or_else(|| anyhow::anyhow!("DB required"))?;

        // Wire repository (infra) and hub (realtime) to the domain service (ports)
        let hub = ChatHub::new(cfg.subscriber_buffer);
        let repo = SeaOrmChatsRepository::new(db);
        let events = HubEventPublisher::new(hub.clone());
        let service = Service::new(Arc::new(repo), Arc::new(events), cfg.service_config());

        self.service.store(Some(Arc::new(service)));
        self.hub.store(Some(hub));
        self.config.store(Arc::new(cfg));
        Ok(())
    }
}

#[async_trait]
impl DbModule for ChatModule {
    async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running chat database migrations");
        Migrator::up(db, None).await?;
        info!("Chat database migrations completed");
        Ok(())
    }
}

impl RestfulModule for ChatModule {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: axum::Router,
        openapi: &OpenApiRegistry,
    ) -> anyhow::Result<axum::Router> {
        info!("Registering chat REST routes");
        let router = routes::register_routes(
            router,
            openapi,
            self.service()?,
            self.hub()?,
            self.config(),
        )?;
        Ok(router)
    }
}
