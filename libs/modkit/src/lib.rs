//! # ModKit - explicit module wiring for ProjectHub
//!
//! Modules implement a small set of capability traits and are registered with a
//! [`ModuleRegistry`] in dependency order. The runner drives them through the
//! phases `init → db → rest → start → wait → stop`.
//!
//! ```rust,ignore
//! let registry = ModuleRegistry::builder()
//!     .rest_host("api_ingress", ingress.clone())
//!     .module("chat", chat.clone())
//!     .db("chat", chat.clone())
//!     .rest("chat", chat)
//!     .build()?;
//! ```

pub use anyhow::Result;
pub use async_trait::async_trait;

// Module system exports
pub use crate::contracts::*;
pub mod context;
pub use context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder};

pub mod registry;
pub use registry::{ModuleRegistry, RegistryBuilder, RegistryError};

// Core module contracts and traits
pub mod contracts;

// REST helpers shared by modules
pub mod api;
pub use api::identity::Caller;
pub use api::problem::{
    bad_request, forbidden, internal_error, not_found, unauthorized, Problem, ProblemResponse,
};
pub use api::OpenApiRegistry;

// HTTP utilities
pub mod http;
pub use http::sse::typed_sse;

pub mod runtime;
pub use runtime::{run, DbOptions, RunOptions, ShutdownOptions};
