//! Dynamic schema registry
//!
//! Durable store of schema definitions plus the checks that keep model names
//! and collection names from colliding. Every successful create or update
//! recompiles the model into the [`ModelCache`].
//!
//! Duplicate-name pre-checks are an early exit only; `put_if_absent` on the
//! definition store is what actually rejects a concurrent duplicate.

use super::compiled_model::ModelHandle;
use super::model_cache::ModelCache;
use super::persistence::SchemaDefinitionStore;
use crate::error::{MercatoError, Result, StorageFailureKind};
use mercato_commons::{ModelName, SchemaDefinition, SYSTEM_SCHEMAS_PARTITION};
use mercato_store::{EntityStoreAsync, Partition, StorageBackend, StorageBackendAsync};
use serde_json::Value;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const STATE_NEW: u8 = 0;
const STATE_OPEN: u8 = 1;
const STATE_SHUT_DOWN: u8 = 2;

pub struct SchemaRegistry {
    backend: Arc<dyn StorageBackend>,
    store: SchemaDefinitionStore,
    cache: ModelCache,
    state: AtomicU8,
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("cached_models", &self.cache.len())
            .field("state", &self.state.load(Ordering::SeqCst))
            .finish()
    }
}

impl SchemaRegistry {
    /// Creates a registry over `backend`. Call [`init`](Self::init) before use.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            store: SchemaDefinitionStore::new(Arc::clone(&backend)),
            cache: ModelCache::new(Arc::clone(&backend)),
            backend,
            state: AtomicU8::new(STATE_NEW),
        }
    }

    /// Ensures the definitions partition exists and compiles every persisted
    /// definition. Returns the number of models loaded.
    pub async fn init(&self) -> Result<usize> {
        log::info!("[SchemaRegistry] Initializing: loading persisted definitions...");
        self.backend
            .create_partition_async(&Partition::new(SYSTEM_SCHEMAS_PARTITION))
            .await?;

        let definitions: Vec<SchemaDefinition> = self
            .store
            .scan_all_async(None)
            .await?
            .into_iter()
            .map(|(_, def)| def)
            .collect();

        let (loaded, _failed) = self.cache.load_all(&definitions);
        self.state.store(STATE_OPEN, Ordering::SeqCst);
        log::info!(
            "[SchemaRegistry] Initialized with {} definition(s)",
            definitions.len()
        );
        Ok(loaded)
    }

    /// Drops every cached handle and rejects further operations.
    pub fn shutdown(&self) {
        if self.state.swap(STATE_SHUT_DOWN, Ordering::SeqCst) != STATE_SHUT_DOWN {
            let evicted = self.cache.len();
            self.cache.clear();
            log::info!("[SchemaRegistry] Shut down, {} cached model(s) dropped", evicted);
        }
    }

    pub fn is_open(&self) -> bool {
        self.state.load(Ordering::SeqCst) == STATE_OPEN
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state.load(Ordering::SeqCst) {
            STATE_OPEN => Ok(()),
            STATE_NEW => Err(MercatoError::storage(
                StorageFailureKind::Backend,
                "registry is not initialized",
            )),
            _ => Err(MercatoError::storage(
                StorageFailureKind::Backend,
                "registry is shut down",
            )),
        }
    }

    /// All persisted definitions, ordered by model name.
    pub async fn list_schemas(&self) -> Result<Vec<SchemaDefinition>> {
        self.ensure_open()?;
        let rows = self.store.scan_all_async(None).await?;
        Ok(rows.into_iter().map(|(_, def)| def).collect())
    }

    pub async fn get_schema(&self, model_name: &str) -> Result<SchemaDefinition> {
        self.ensure_open()?;
        let name = Self::existing_name(model_name)?;
        self.load_definition(&name).await
    }

    /// Validates, persists and compiles a new model.
    pub async fn create_schema(
        &self,
        model_name: &str,
        fields: &Value,
        options: &Value,
    ) -> Result<SchemaDefinition> {
        self.ensure_open()?;
        let name = ModelName::new(model_name)?;
        let (fields, options) = SchemaDefinition::parse_parts(fields, options)?;
        let definition = SchemaDefinition::new(name.clone(), fields, options)?;

        if self.store.get_async(&name).await?.is_some() {
            return Err(MercatoError::DuplicateDefinition(name.into_string()));
        }

        let collection = Partition::new(definition.collection_name());
        self.ensure_collection_free(&name, &collection).await?;

        if !self.store.put_if_absent_async(&name, &definition).await? {
            return Err(MercatoError::DuplicateDefinition(name.into_string()));
        }

        if let Err(e) = self.backend.create_partition_async(&collection).await {
            self.rollback_definition(&name).await;
            return Err(e.into());
        }

        self.cache
            .recompile(&name, &definition.fields, &definition.options)?;
        log::info!(
            "[SchemaRegistry] Created model '{}' (collection '{}')",
            name,
            collection
        );
        Ok(definition)
    }

    /// Replaces the fields and options of `current_name`, optionally renaming
    /// it.
    ///
    /// A rename leaves the handle cached under the old name in place; only the
    /// new name is recompiled.
    pub async fn update_schema(
        &self,
        current_name: &str,
        fields: &Value,
        options: &Value,
        new_name: Option<&str>,
    ) -> Result<SchemaDefinition> {
        self.ensure_open()?;
        let current = Self::existing_name(current_name)?;
        let (fields, options) = SchemaDefinition::parse_parts(fields, options)?;
        let existing = self.load_definition(&current).await?;

        let target = match new_name {
            Some(n) => ModelName::new(n)?,
            None => current.clone(),
        };
        let renaming = target != current;

        if renaming && self.store.get_async(&target).await?.is_some() {
            return Err(MercatoError::DuplicateDefinition(target.into_string()));
        }

        let old_collection = existing.collection_name();
        let new_collection = options.collection_for(&target);
        let moves_collection = new_collection != old_collection;
        let collection = Partition::new(new_collection);
        if moves_collection {
            self.ensure_collection_free(&target, &collection).await?;
        }

        let updated = existing.updated(target.clone(), fields, options)?;

        if renaming {
            if !self.store.put_if_absent_async(&target, &updated).await? {
                return Err(MercatoError::DuplicateDefinition(target.into_string()));
            }
            if let Err(e) = self.store.delete_async(&current).await {
                self.rollback_definition(&target).await;
                return Err(e.into());
            }
        } else {
            self.store.put_async(&target, &updated).await?;
        }

        if moves_collection {
            if let Err(e) = self.backend.create_partition_async(&collection).await {
                self.restore_definition(&existing, &target).await;
                return Err(e.into());
            }
        }

        self.cache
            .recompile(&target, &updated.fields, &updated.options)?;
        if renaming {
            log::info!(
                "[SchemaRegistry] Renamed model '{}' to '{}' (collection '{}')",
                current,
                target,
                collection
            );
        } else {
            log::info!("[SchemaRegistry] Updated model '{}'", target);
        }
        Ok(updated)
    }

    /// Removes a definition and evicts its handle. Deleting an unknown name
    /// is a no-op. The collection and its documents are kept.
    pub async fn delete_schema(&self, model_name: &str) -> Result<()> {
        self.ensure_open()?;
        let Ok(name) = ModelName::new(model_name) else {
            return Ok(());
        };
        self.store.delete_async(&name).await?;
        self.cache.evict(&name);
        log::info!("[SchemaRegistry] Deleted model '{}'", name);
        Ok(())
    }

    /// Resolves a model name to its compiled handle, compiling it from the
    /// persisted definition on a cache miss.
    pub async fn model(&self, model_name: &str) -> Result<ModelHandle> {
        self.ensure_open()?;
        let name = Self::existing_name(model_name)?;
        if let Some(handle) = self.cache.get(&name) {
            return Ok(handle);
        }
        let definition = self.load_definition(&name).await?;
        self.cache
            .insert_compiled(&name, &definition.fields, &definition.options)
    }

    /// Parses a name that must refer to an existing definition. A malformed
    /// name cannot exist, so it is reported as not found.
    fn existing_name(model_name: &str) -> Result<ModelName> {
        ModelName::new(model_name)
            .map_err(|_| MercatoError::DefinitionNotFound(model_name.to_string()))
    }

    async fn load_definition(&self, name: &ModelName) -> Result<SchemaDefinition> {
        self.store
            .get_async(name)
            .await?
            .ok_or_else(|| MercatoError::DefinitionNotFound(name.to_string()))
    }

    async fn ensure_collection_free(&self, name: &ModelName, collection: &Partition) -> Result<()> {
        if self.backend.partition_exists_async(collection).await? {
            return Err(MercatoError::CollectionCollision {
                model_name: name.to_string(),
                collection: collection.name().to_string(),
            });
        }
        Ok(())
    }

    /// Puts `previous` back after a failed update that already wrote the
    /// definition under `written`.
    async fn restore_definition(&self, previous: &SchemaDefinition, written: &ModelName) {
        if written != &previous.model_name {
            self.rollback_definition(written).await;
        }
        if let Err(e) = self.store.put_async(&previous.model_name, previous).await {
            log::error!(
                "[SchemaRegistry] Failed to restore definition '{}': {}",
                previous.model_name,
                e
            );
        }
    }

    async fn rollback_definition(&self, name: &ModelName) {
        if let Err(e) = self.store.delete_async(name).await {
            log::error!(
                "[SchemaRegistry] Failed to roll back definition '{}': {}",
                name,
                e
            );
        }
    }
}
