//! Application context shared by every request handler.
//!
//! One `AppContext` is built per server (or per test) and injected where it is
//! needed; there is no process-global instance.

use crate::error::Result;
use crate::schema_registry::SchemaRegistry;
use mercato_configs::ServerConfig;
use mercato_store::StorageBackend;
use std::sync::Arc;
use std::time::Instant;

pub struct AppContext {
    // ===== Configuration =====
    config: Arc<ServerConfig>,

    // ===== Storage =====
    storage_backend: Arc<dyn StorageBackend>,

    // ===== Dynamic models =====
    schema_registry: Arc<SchemaRegistry>,

    // ===== Server Start Time (for uptime calculation) =====
    server_start_time: Instant,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("schema_registry", &self.schema_registry)
            .field("storage_backend", &"Arc<dyn StorageBackend>")
            .field("uptime_seconds", &self.uptime_seconds())
            .finish()
    }
}

impl AppContext {
    /// Builds the context and initializes the schema registry, compiling every
    /// persisted model.
    pub async fn init(
        storage_backend: Arc<dyn StorageBackend>,
        config: ServerConfig,
    ) -> Result<Arc<AppContext>> {
        let schema_registry = Arc::new(SchemaRegistry::new(Arc::clone(&storage_backend)));
        let loaded = schema_registry.init().await?;
        log::info!("AppContext initialized ({} dynamic model(s) ready)", loaded);

        Ok(Arc::new(AppContext {
            config: Arc::new(config),
            storage_backend,
            schema_registry,
            server_start_time: Instant::now(),
        }))
    }

    pub fn config(&self) -> &Arc<ServerConfig> {
        &self.config
    }

    pub fn storage_backend(&self) -> Arc<dyn StorageBackend> {
        Arc::clone(&self.storage_backend)
    }

    pub fn schema_registry(&self) -> Arc<SchemaRegistry> {
        Arc::clone(&self.schema_registry)
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.server_start_time.elapsed().as_secs()
    }

    /// Shuts the registry down. Idempotent.
    pub fn shutdown(&self) {
        self.schema_registry.shutdown();
    }

    pub fn is_shut_down(&self) -> bool {
        !self.schema_registry.is_open()
    }
}
