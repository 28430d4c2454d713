//! Capabilities a module can expose to the host.
//!
//! The runner drives them in a fixed order: every [`Module::init`], then
//! [`DbModule::migrate`], then the REST phase ([`RestHostModule::rest_prepare`],
//! each [`RestfulModule::register_rest`], [`RestHostModule::rest_finalize`]),
//! then [`StatefulModule::start`]. `stop` runs in reverse on shutdown.

use async_trait::async_trait;
use axum::Router;
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;

pub use crate::api::OpenApiRegistry;

/// Wiring step. The schema may not exist yet, so no queries here.
#[async_trait]
pub trait Module: Send + Sync + 'static {
    async fn init(&self, ctx: &crate::context::ModuleCtx) -> anyhow::Result<()>;
}

/// Owns tables; migrations run once the connection is up.
#[async_trait]
pub trait DbModule: Send + Sync {
    async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()>;
}

/// Adds routes and their OpenAPI paths to the shared router.
pub trait RestfulModule: Send + Sync {
    fn register_rest(
        &self,
        ctx: &crate::context::ModuleCtx,
        router: Router,
        openapi: &OpenApiRegistry,
    ) -> anyhow::Result<Router>;
}

/// The single HTTP host. It wraps the module routes but serves them only in `start`.
pub trait RestHostModule: Send + Sync + 'static {
    /// Base router with host-owned routes such as `/health`.
    fn rest_prepare(
        &self,
        ctx: &crate::context::ModuleCtx,
        router: Router,
    ) -> anyhow::Result<Router>;

    /// Attach `/openapi.json`, `/docs` and global layers, then keep the router for `start`.
    fn rest_finalize(
        &self,
        ctx: &crate::context::ModuleCtx,
        router: Router,
        openapi: &OpenApiRegistry,
    ) -> anyhow::Result<Router>;
}

/// Long-running work tied to the process lifetime (the HTTP listener).
#[async_trait]
pub trait StatefulModule: Send + Sync {
    async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()>;
    async fn stop(&self, cancel: CancellationToken) -> anyhow::Result<()>;
}
