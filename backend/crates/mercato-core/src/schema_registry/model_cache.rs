use super::compiled_model::{CompiledModel, ModelHandle};
use crate::error::Result;
use dashmap::DashMap;
use mercato_commons::{FieldMap, ModelName, SchemaDefinition, SchemaOptions};
use mercato_store::StorageBackend;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process-wide map from model name to compiled handle.
///
/// Reads and writes interleave without a cache-wide lock. Two concurrent
/// misses for the same name both compile; the later insert wins.
pub struct ModelCache {
    models: DashMap<ModelName, ModelHandle>,

    /// Cache hit count (for metrics)
    hits: AtomicU64,

    /// Cache miss count (for metrics)
    misses: AtomicU64,

    backend: Arc<dyn StorageBackend>,
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

impl ModelCache {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            models: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            backend,
        }
    }

    /// Get the cached handle for `name`
    pub fn get(&self, name: &ModelName) -> Option<ModelHandle> {
        if let Some(entry) = self.models.get(name) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            Some(Arc::clone(entry.value()))
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Returns the cached handle, or compiles and registers one on a miss.
    ///
    /// On a hit `fields` and `options` are ignored, even when they differ from
    /// what the cached handle was compiled from. Schema changes must go through
    /// [`recompile`](Self::recompile).
    pub fn get_or_create(
        &self,
        name: &ModelName,
        fields: &FieldMap,
        options: &SchemaOptions,
    ) -> Result<ModelHandle> {
        if let Some(handle) = self.get(name) {
            return Ok(handle);
        }
        self.insert_compiled(name, fields, options)
    }

    /// Compiles and registers a handle after a miss the caller already
    /// counted through [`get`](Self::get).
    pub fn insert_compiled(
        &self,
        name: &ModelName,
        fields: &FieldMap,
        options: &SchemaOptions,
    ) -> Result<ModelHandle> {
        let handle = self.compile(name, fields, options)?;
        self.models.insert(name.clone(), Arc::clone(&handle));
        log::debug!(
            "[ModelCache] Compiled '{}' (generation {})",
            name,
            handle.generation()
        );
        Ok(handle)
    }

    /// Compiles a fresh handle and replaces whatever is cached under `name`.
    pub fn recompile(
        &self,
        name: &ModelName,
        fields: &FieldMap,
        options: &SchemaOptions,
    ) -> Result<ModelHandle> {
        let handle = self.compile(name, fields, options)?;
        self.models.insert(name.clone(), Arc::clone(&handle));
        log::debug!(
            "[ModelCache] Recompiled '{}' (generation {})",
            name,
            handle.generation()
        );
        Ok(handle)
    }

    /// Removes the entry for `name`. Returns the evicted handle, if any.
    pub fn evict(&self, name: &ModelName) -> Option<ModelHandle> {
        let evicted = self.models.remove(name).map(|(_, handle)| handle);
        if evicted.is_some() {
            log::debug!("[ModelCache] Evicted '{}'", name);
        }
        evicted
    }

    /// Compiles a handle for every definition. Returns `(loaded, failed)`.
    ///
    /// A definition that no longer compiles is logged and skipped so one bad
    /// record cannot keep the rest of the models offline.
    pub fn load_all(&self, definitions: &[SchemaDefinition]) -> (usize, usize) {
        let mut loaded = 0;
        let mut failed = 0;
        for def in definitions {
            match self.recompile(&def.model_name, &def.fields, &def.options) {
                Ok(_) => loaded += 1,
                Err(e) => {
                    failed += 1;
                    log::warn!(
                        "[ModelCache] Failed to compile '{}' at startup: {}",
                        def.model_name,
                        e
                    );
                }
            }
        }
        log::info!(
            "[ModelCache] Loaded {} model(s), {} failed",
            loaded,
            failed
        );
        (loaded, failed)
    }

    fn compile(
        &self,
        name: &ModelName,
        fields: &FieldMap,
        options: &SchemaOptions,
    ) -> Result<ModelHandle> {
        CompiledModel::compile(name.clone(), fields, options, Arc::clone(&self.backend))
            .map(Arc::new)
    }

    /// Returns true when a handle is cached under `name`. Does not count as
    /// a hit or miss.
    pub fn contains(&self, name: &ModelName) -> bool {
        self.models.contains_key(name)
    }

    /// Names of all cached models, sorted.
    pub fn names(&self) -> Vec<ModelName> {
        let mut names: Vec<ModelName> = self.models.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Get cache hit rate (for metrics)
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.models.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            hit_rate: self.hit_rate(),
        }
    }

    /// Clear all cached handles and counters
    pub fn clear(&self) {
        self.models.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mercato_commons::{FieldDescriptor, FieldType};
    use mercato_store::test_utils::memory_backend;

    fn name(s: &str) -> ModelName {
        ModelName::new(s).unwrap()
    }

    fn fields(field: &str) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert(field.to_string(), FieldDescriptor::of_type(FieldType::String));
        map
    }

    #[test]
    fn test_hit_ignores_arguments() {
        let cache = ModelCache::new(memory_backend());
        let opts = SchemaOptions::default();

        let first = cache.get_or_create(&name("Tag"), &fields("label"), &opts).unwrap();
        let second = cache.get_or_create(&name("Tag"), &fields("other"), &opts).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.fields(), &fields("label"));

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 0.5);
    }

    #[test]
    fn test_recompile_replaces_entry() {
        let cache = ModelCache::new(memory_backend());
        let opts = SchemaOptions::default();

        let old = cache.get_or_create(&name("Tag"), &fields("label"), &opts).unwrap();
        let new = cache.recompile(&name("Tag"), &fields("other"), &opts).unwrap();

        assert!(!Arc::ptr_eq(&old, &new));
        assert!(new.generation() > old.generation());
        let current = cache.get(&name("Tag")).unwrap();
        assert!(Arc::ptr_eq(&current, &new));
    }

    #[test]
    fn test_insert_compiled_counts_nothing() {
        let cache = ModelCache::new(memory_backend());
        let opts = SchemaOptions::default();

        assert!(cache.get(&name("Tag")).is_none());
        let handle = cache.insert_compiled(&name("Tag"), &fields("label"), &opts).unwrap();
        let cached = cache.get(&name("Tag")).unwrap();
        assert!(Arc::ptr_eq(&handle, &cached));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn test_evict_and_clear() {
        let cache = ModelCache::new(memory_backend());
        let opts = SchemaOptions::default();
        cache.get_or_create(&name("Tag"), &fields("label"), &opts).unwrap();
        cache.get_or_create(&name("Brand"), &fields("label"), &opts).unwrap();
        assert_eq!(cache.names(), vec![name("Brand"), name("Tag")]);

        assert!(cache.evict(&name("Tag")).is_some());
        assert!(cache.evict(&name("Tag")).is_none());
        assert!(!cache.contains(&name("Tag")));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 0);
    }

    #[test]
    fn test_load_all() {
        let cache = ModelCache::new(memory_backend());
        let defs = vec![
            SchemaDefinition::new(name("Tag"), fields("label"), SchemaOptions::default())
                .unwrap(),
            SchemaDefinition::new(name("Brand"), fields("label"), SchemaOptions::default())
                .unwrap(),
        ];
        assert_eq!(cache.load_all(&defs), (2, 0));
        assert!(cache.contains(&name("Tag")));
        assert!(cache.contains(&name("Brand")));
    }
}
