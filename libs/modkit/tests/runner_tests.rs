//! Runner lifecycle tests: phase ordering, DB migration and shutdown options.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use parking_lot::Mutex;
use sea_orm::DatabaseConnection;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use modkit::{
    run, ConfigProvider, DbModule, DbOptions, Module, ModuleCtx, ModuleRegistry, OpenApiRegistry,
    RestfulModule, RunOptions, ShutdownOptions, StatefulModule,
};

type CallTracker = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
struct MapConfig(HashMap<String, serde_json::Value>);

impl ConfigProvider for MapConfig {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.0.get(module_name)
    }
}

struct TrackedModule {
    name: &'static str,
    calls: CallTracker,
    fail_init: bool,
}

impl TrackedModule {
    fn new(name: &'static str, calls: &CallTracker) -> Arc<Self> {
        Arc::new(Self {
            name,
            calls: calls.clone(),
            fail_init: false,
        })
    }

    fn record(&self, phase: &str) {
        self.calls.lock().push(format!("{phase}:{}", self.name));
    }
}

#[async_trait]
impl Module for TrackedModule {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        self.record("init");
        if self.fail_init {
            anyhow::bail!("init refused");
        }
        let limit: serde_json::Value = ctx.module_config();
        if !limit.is_null() {
            self.record("config");
        }
        Ok(())
    }
}

#[async_trait]
impl DbModule for TrackedModule {
    async fn migrate(&self, _db: &DatabaseConnection) -> anyhow::Result<()> {
        self.record("db");
        Ok(())
    }
}

impl RestfulModule for TrackedModule {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: Router,
        _openapi: &OpenApiRegistry,
    ) -> anyhow::Result<Router> {
        self.record("rest");
        Ok(router)
    }
}

#[async_trait]
impl StatefulModule for TrackedModule {
    async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        self.record("start");
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        self.record("stop");
        Ok(())
    }
}

fn registry(a: Arc<TrackedModule>) -> ModuleRegistry {
    ModuleRegistry::builder()
        .module("tracked", a.clone())
        .db("tracked", a.clone())
        .stateful("tracked", a)
        .build()
        .unwrap()
}

#[tokio::test]
async fn token_shutdown_runs_every_phase_in_order() {
    let calls = CallTracker::default();
    let module = TrackedModule::new("tracked", &calls);
    let mut cfg = MapConfig::default();
    cfg.0
        .insert("tracked".into(), serde_json::json!({ "limit": 3 }));

    let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(run(RunOptions {
        registry: registry(module),
        modules_cfg: Arc::new(cfg),
        db: DbOptions::Connection(db),
        shutdown: ShutdownOptions::Token(cancel.clone()),
    }));

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    timeout(Duration::from_secs(2), handle)
        .await
        .expect("runner should stop")
        .unwrap()
        .unwrap();

    assert_eq!(
        *calls.lock(),
        vec![
            "init:tracked",
            "config:tracked",
            "db:tracked",
            "start:tracked",
            "stop:tracked"
        ]
    );
}

#[tokio::test]
async fn future_shutdown_without_db_skips_migrations() {
    let calls = CallTracker::default();
    let module = TrackedModule::new("tracked", &calls);

    let result = timeout(
        Duration::from_secs(2),
        run(RunOptions {
            registry: registry(module),
            modules_cfg: Arc::new(MapConfig::default()),
            db: DbOptions::None,
            shutdown: ShutdownOptions::Future(Box::pin(async {
                tokio::time::sleep(Duration::from_millis(20)).await;
            })),
        }),
    )
    .await
    .expect("runner should stop");

    assert!(result.is_ok());
    assert!(!calls.lock().iter().any(|c| c.starts_with("db:")));
}

#[tokio::test]
async fn failing_init_aborts_before_start() {
    let calls = CallTracker::default();
    let module = Arc::new(TrackedModule {
        name: "tracked",
        calls: calls.clone(),
        fail_init: true,
    });

    let err = run(RunOptions {
        registry: registry(module),
        modules_cfg: Arc::new(MapConfig::default()),
        db: DbOptions::None,
        shutdown: ShutdownOptions::Token(CancellationToken::new()),
    })
    .await
    .unwrap_err();

    assert!(err.to_string().contains("tracked"));
    assert_eq!(*calls.lock(), vec!["init:tracked"]);
}

#[tokio::test]
async fn rest_module_without_host_fails_the_run() {
    let calls = CallTracker::default();
    let module = TrackedModule::new("tracked", &calls);
    let registry = ModuleRegistry::builder()
        .module("tracked", module.clone())
        .rest("tracked", module)
        .build()
        .unwrap();

    let err = run(RunOptions {
        registry,
        modules_cfg: Arc::new(MapConfig::default()),
        db: DbOptions::None,
        shutdown: ShutdownOptions::Token(CancellationToken::new()),
    })
    .await
    .unwrap_err();

    assert!(err.to_string().contains("rest_host"));
}
