//! REST helpers shared by modules: problem responses, caller identity and the
//! OpenAPI document that modules contribute to during the REST phase.

pub mod identity;
pub mod problem;

use parking_lot::Mutex;
use utoipa::openapi::{InfoBuilder, OpenApi, OpenApiBuilder};

/// Collects per-module OpenAPI fragments into one document.
pub struct OpenApiRegistry {
    doc: Mutex<OpenApi>,
}

impl Default for OpenApiRegistry {
    fn default() -> Self {
        let info = InfoBuilder::new()
            .title("ProjectHub API")
            .version(env!("CARGO_PKG_VERSION"))
            .build();
        Self {
            doc: Mutex::new(OpenApiBuilder::new().info(info).build()),
        }
    }
}

impl OpenApiRegistry {
    /// Merge paths and components of a module document.
    pub fn register(&self, fragment: OpenApi) {
        self.doc.lock().merge(fragment);
    }

    /// Snapshot of the merged document.
    pub fn document(&self) -> OpenApi {
        self.doc.lock().clone()
    }
}
