//! Persisted schema definitions in the `system_schemas` partition.

use mercato_commons::{ModelName, SchemaDefinition, SYSTEM_SCHEMAS_PARTITION};
use mercato_store::{EntityStore, StorageBackend};
use std::sync::Arc;

/// Typed store of `SchemaDefinition`s keyed by model name.
///
/// `put_if_absent` on this store is the unique constraint on `modelName`.
pub struct SchemaDefinitionStore {
    backend: Arc<dyn StorageBackend>,
}

impl SchemaDefinitionStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }
}

impl EntityStore<ModelName, SchemaDefinition> for SchemaDefinitionStore {
    fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    fn partition(&self) -> &str {
        SYSTEM_SCHEMAS_PARTITION
    }
}
