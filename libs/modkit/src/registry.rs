use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use sea_orm::DatabaseConnection;
use thiserror::Error;

use crate::api::OpenApiRegistry;
use crate::context;
use crate::contracts;

pub struct ModuleEntry {
    pub name: &'static str,
    pub core: Arc<dyn contracts::Module>,
    pub rest: Option<Arc<dyn contracts::RestfulModule>>,
    pub rest_host: Option<Arc<dyn contracts::RestHostModule>>,
    pub db: Option<Arc<dyn contracts::DbModule>>,
    pub stateful: Option<Arc<dyn contracts::StatefulModule>>,
}

impl std::fmt::Debug for ModuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleEntry")
            .field("name", &self.name)
            .field("has_rest", &self.rest.is_some())
            .field("is_rest_host", &self.rest_host.is_some())
            .field("has_db", &self.db.is_some())
            .field("has_stateful", &self.stateful.is_some())
            .finish()
    }
}

/// Runtime registry; modules run in registration order (dependencies first).
pub struct ModuleRegistry {
    modules: Vec<ModuleEntry>,
    openapi: OpenApiRegistry,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&'static str> = self.modules.iter().map(|m| m.name).collect();
        f.debug_struct("ModuleRegistry")
            .field("modules", &names)
            .finish()
    }
}

impl ModuleRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn openapi(&self) -> &OpenApiRegistry {
        &self.openapi
    }

    // ---- Ordered phases: init → DB → REST (sync) → start → stop ----

    pub async fn run_init_phase(&self, base_ctx: &context::ModuleCtx) -> Result<(), RegistryError> {
        for e in &self.modules {
            let ctx = base_ctx.clone().for_module(e.name);
            e.core
                .init(&ctx)
                .await
                .map_err(|source| RegistryError::Init {
                    module: e.name,
                    source,
                })?;
        }
        Ok(())
    }

    pub async fn run_db_phase(&self, db: &DatabaseConnection) -> Result<(), RegistryError> {
        for e in &self.modules {
            if let Some(dbm) = &e.db {
                dbm.migrate(db)
                    .await
                    .map_err(|source| RegistryError::DbMigrate {
                        module: e.name,
                        source,
                    })?;
            }
        }
        Ok(())
    }

    pub fn run_rest_phase(
        &self,
        base_ctx: &context::ModuleCtx,
        mut router: Router,
    ) -> Result<Router, RegistryError> {
        let Some(host_entry) = self.modules.iter().find(|e| e.rest_host.is_some()) else {
            return if self.modules.iter().any(|e| e.rest.is_some()) {
                Err(RegistryError::RestRequiresHost)
            } else {
                Ok(router)
            };
        };
        let Some(host) = host_entry.rest_host.as_ref() else {
            return Err(RegistryError::RestRequiresHost);
        };
        let host_ctx = base_ctx.clone().for_module(host_entry.name);

        // 1) Host prepare: base Router
        router =
            host.rest_prepare(&host_ctx, router)
                .map_err(|source| RegistryError::RestPrepare {
                    module: host_entry.name,
                    source,
                })?;

        // 2) Register all REST providers
        for e in &self.modules {
            if let Some(rest) = &e.rest {
                let ctx = base_ctx.clone().for_module(e.name);
                router = rest
                    .register_rest(&ctx, router, &self.openapi)
                    .map_err(|source| RegistryError::RestRegister {
                        module: e.name,
                        source,
                    })?;
            }
        }

        // 3) Host finalize: attach /openapi.json and /docs, global layers
        router = host
            .rest_finalize(&host_ctx, router, &self.openapi)
            .map_err(|source| RegistryError::RestFinalize {
                module: host_entry.name,
                source,
            })?;

        Ok(router)
    }

    pub async fn run_start_phase(&self, cancel: CancellationToken) -> Result<(), RegistryError> {
        for e in &self.modules {
            if let Some(s) = &e.stateful {
                s.start(cancel.clone())
                    .await
                    .map_err(|source| RegistryError::Start {
                        module: e.name,
                        source,
                    })?;
            }
        }
        Ok(())
    }

    pub async fn run_stop_phase(&self, cancel: CancellationToken) -> Result<(), RegistryError> {
        for e in self.modules.iter().rev() {
            if let Some(s) = &e.stateful {
                if let Err(err) = s.stop(cancel.clone()).await {
                    tracing::warn!(module = e.name, error = %err, "Failed to stop module");
                }
            }
        }
        Ok(())
    }
}

/// Builder fed by the host application. Keys are module **names**.
#[derive(Default)]
pub struct RegistryBuilder {
    order: Vec<&'static str>,
    core: HashMap<&'static str, Arc<dyn contracts::Module>>,
    rest: HashMap<&'static str, Arc<dyn contracts::RestfulModule>>,
    rest_host: Option<(&'static str, Arc<dyn contracts::RestHostModule>)>,
    db: HashMap<&'static str, Arc<dyn contracts::DbModule>>,
    stateful: HashMap<&'static str, Arc<dyn contracts::StatefulModule>>,
    errors: Vec<String>,
}

impl RegistryBuilder {
    pub fn module(mut self, name: &'static str, m: Arc<dyn contracts::Module>) -> Self {
        if self.core.contains_key(name) {
            self.errors
                .push(format!("Module '{name}' is already registered"));
            return self;
        }
        self.order.push(name);
        self.core.insert(name, m);
        self
    }

    pub fn rest(mut self, name: &'static str, m: Arc<dyn contracts::RestfulModule>) -> Self {
        self.rest.insert(name, m);
        self
    }

    pub fn rest_host(mut self, name: &'static str, m: Arc<dyn contracts::RestHostModule>) -> Self {
        if let Some((existing, _)) = &self.rest_host {
            self.errors.push(format!(
                "Multiple REST host modules detected: '{}' and '{}'. Only one REST host is allowed.",
                existing, name
            ));
            return self;
        }
        self.rest_host = Some((name, m));
        self
    }

    pub fn db(mut self, name: &'static str, m: Arc<dyn contracts::DbModule>) -> Self {
        self.db.insert(name, m);
        self
    }

    pub fn stateful(mut self, name: &'static str, m: Arc<dyn contracts::StatefulModule>) -> Self {
        self.stateful.insert(name, m);
        self
    }

    pub fn build(mut self) -> Result<ModuleRegistry, RegistryError> {
        if !self.errors.is_empty() {
            return Err(RegistryError::InvalidRegistrations {
                errors: self.errors,
            });
        }

        // Capabilities must belong to a registered core module.
        let mut dangling: Vec<&'static str> = self
            .rest
            .keys()
            .chain(self.db.keys())
            .chain(self.stateful.keys())
            .chain(self.rest_host.iter().map(|(n, _)| n))
            .copied()
            .filter(|n| !self.core.contains_key(n))
            .collect();
        dangling.sort_unstable();
        dangling.dedup();
        if let Some(name) = dangling.first() {
            return Err(RegistryError::UnknownModule {
                name: name.to_string(),
            });
        }

        let mut modules = Vec::with_capacity(self.order.len());
        for name in self.order {
            let Some(core) = self.core.remove(name) else {
                continue;
            };
            let rest_host = match &self.rest_host {
                Some((host, m)) if *host == name => Some(m.clone()),
                _ => None,
            };
            modules.push(ModuleEntry {
                name,
                core,
                rest: self.rest.remove(name),
                rest_host,
                db: self.db.remove(name),
                stateful: self.stateful.remove(name),
            });
        }

        tracing::info!(
            modules = ?modules.iter().map(|m| m.name).collect::<Vec<_>>(),
            "Module registry built"
        );

        Ok(ModuleRegistry {
            modules,
            openapi: OpenApiRegistry::default(),
        })
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("initialization failed for module '{module}'")]
    Init {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("DB migration failed for module '{module}'")]
    DbMigrate {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST prepare failed for host module '{module}'")]
    RestPrepare {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST registration failed for module '{module}'")]
    RestRegister {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST finalize failed for host module '{module}'")]
    RestFinalize {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST phase requires an ingress host: modules with capability 'rest' found, but no module with capability 'rest_host'")]
    RestRequiresHost,
    #[error("start failed for module '{module}'")]
    Start {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("capability registered for unknown module '{name}'")]
    UnknownModule { name: String },
    #[error("invalid module registrations: {errors:?}")]
    InvalidRegistrations { errors: Vec<String> },
}
