//! Type-safe entity storage with generic key types.
//!
//! ```text
//! EntityStore<K, V>        ← Typed entity CRUD (this file)
//!     ↓
//! StorageBackend           ← Generic K/V operations (storage_trait.rs)
//!     ↓
//! InMemory / RocksDB       ← Actual storage implementation
//! ```

use crate::storage_trait::{Partition, Result, StorageBackend, StorageBackendAsync, StorageError};
use mercato_commons::StorageKey;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Hard cap for `scan_all` so a runaway partition cannot exhaust memory.
const MAX_SCAN_LIMIT: usize = 100_000;

/// Typed entity storage with type-safe keys and JSON serialization.
///
/// ## Type Parameters
/// - `K`: Key type that implements StorageKey (ModelName, DocumentId, ...)
/// - `V`: Value/entity type that must be Serialize + Deserialize
pub trait EntityStore<K, V>
where
    K: StorageKey,
    V: Serialize + for<'de> Deserialize<'de> + Send + Sync,
{
    /// Returns a reference to the storage backend.
    fn backend(&self) -> &Arc<dyn StorageBackend>;

    /// Returns the partition name for this entity type.
    fn partition(&self) -> &str;

    /// Serializes an entity to bytes (JSON).
    fn serialize(&self, entity: &V) -> Result<Vec<u8>> {
        serde_json::to_vec(entity).map_err(|e| StorageError::SerializationError(e.to_string()))
    }

    /// Deserializes bytes to an entity (JSON).
    fn deserialize(&self, bytes: &[u8]) -> Result<V> {
        serde_json::from_slice(bytes).map_err(|e| StorageError::SerializationError(e.to_string()))
    }

    /// Stores an entity, replacing any existing value under `key`.
    fn put(&self, key: &K, entity: &V) -> Result<()> {
        let partition = Partition::new(self.partition());
        let value = self.serialize(entity)?;
        self.backend().put(&partition, &key.storage_key(), &value)
    }

    /// Stores an entity only if `key` is free. Returns `Ok(false)` otherwise.
    fn put_if_absent(&self, key: &K, entity: &V) -> Result<bool> {
        let partition = Partition::new(self.partition());
        let value = self.serialize(entity)?;
        self.backend()
            .put_if_absent(&partition, &key.storage_key(), &value)
    }

    /// Retrieves an entity by key. Returns `Ok(None)` if the key doesn't exist.
    fn get(&self, key: &K) -> Result<Option<V>> {
        let partition = Partition::new(self.partition());
        match self.backend().get(&partition, &key.storage_key())? {
            Some(bytes) => Ok(Some(self.deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Deletes an entity by key. Idempotent.
    fn delete(&self, key: &K) -> Result<()> {
        let partition = Partition::new(self.partition());
        self.backend().delete(&partition, &key.storage_key())
    }

    /// Scans all entities in the partition, in key order.
    fn scan_all(&self) -> Result<Vec<(Vec<u8>, V)>> {
        let partition = Partition::new(self.partition());
        let iter = self
            .backend()
            .scan(&partition, None, None, Some(MAX_SCAN_LIMIT))?;

        let mut results = Vec::new();
        for (key_bytes, value_bytes) in iter {
            results.push((key_bytes, self.deserialize(&value_bytes)?));
        }
        if results.len() >= MAX_SCAN_LIMIT {
            log::warn!(
                "Scan of '{}' reached max limit of {} entries, stopping early",
                self.partition(),
                MAX_SCAN_LIMIT
            );
        }
        Ok(results)
    }
}

/// Async versions of the `EntityStore` methods, offloaded through
/// [`StorageBackendAsync`].
#[async_trait::async_trait]
pub trait EntityStoreAsync<K, V>: EntityStore<K, V> + Sync
where
    K: StorageKey,
    V: Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static,
{
    async fn put_async(&self, key: &K, entity: &V) -> Result<()> {
        let partition = Partition::new(self.partition());
        let value = self.serialize(entity)?;
        self.backend()
            .put_async(&partition, &key.storage_key(), &value)
            .await
    }

    async fn put_if_absent_async(&self, key: &K, entity: &V) -> Result<bool> {
        let partition = Partition::new(self.partition());
        let value = self.serialize(entity)?;
        self.backend()
            .put_if_absent_async(&partition, &key.storage_key(), &value)
            .await
    }

    async fn get_async(&self, key: &K) -> Result<Option<V>> {
        let partition = Partition::new(self.partition());
        match self.backend().get_async(&partition, &key.storage_key()).await? {
            Some(bytes) => Ok(Some(self.deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn delete_async(&self, key: &K) -> Result<()> {
        let partition = Partition::new(self.partition());
        self.backend()
            .delete_async(&partition, &key.storage_key())
            .await
    }

    async fn scan_all_async(&self, limit: Option<usize>) -> Result<Vec<(Vec<u8>, V)>> {
        let partition = Partition::new(self.partition());
        let limit = limit.unwrap_or(MAX_SCAN_LIMIT).min(MAX_SCAN_LIMIT);
        let rows = self
            .backend()
            .scan_async(&partition, None, None, Some(limit))
            .await?;
        rows.into_iter()
            .map(|(key, bytes)| Ok((key, self.deserialize(&bytes)?)))
            .collect()
    }
}

impl<K, V, T> EntityStoreAsync<K, V> for T
where
    T: EntityStore<K, V> + Sync,
    K: StorageKey,
    V: Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_impl::InMemoryBackend;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sku {
        code: String,
        stock: u32,
    }

    struct SkuStore {
        backend: Arc<dyn StorageBackend>,
    }

    impl EntityStore<String, Sku> for SkuStore {
        fn backend(&self) -> &Arc<dyn StorageBackend> {
            &self.backend
        }

        fn partition(&self) -> &str {
            "skus"
        }
    }

    fn store() -> SkuStore {
        let backend: Arc<dyn StorageBackend> = Arc::new(InMemoryBackend::new());
        backend.create_partition(&Partition::new("skus")).unwrap();
        SkuStore { backend }
    }

    fn sku(code: &str, stock: u32) -> Sku {
        Sku {
            code: code.to_string(),
            stock,
        }
    }

    #[test]
    fn test_put_get_delete() {
        let store = store();
        let key = "A-1".to_string();
        store.put(&key, &sku("A-1", 3)).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(sku("A-1", 3)));

        store.delete(&key).unwrap();
        assert_eq!(store.get(&key).unwrap(), None);
    }

    #[test]
    fn test_put_if_absent_keeps_first() {
        let store = store();
        let key = "A-1".to_string();
        assert!(store.put_if_absent(&key, &sku("A-1", 3)).unwrap());
        assert!(!store.put_if_absent(&key, &sku("A-1", 9)).unwrap());
        assert_eq!(store.get(&key).unwrap().unwrap().stock, 3);
    }

    #[test]
    fn test_scan_all_in_key_order() {
        let store = store();
        for code in ["C", "A", "B"] {
            store.put(&code.to_string(), &sku(code, 1)).unwrap();
        }
        let codes: Vec<String> = store
            .scan_all()
            .unwrap()
            .into_iter()
            .map(|(_, s)| s.code)
            .collect();
        assert_eq!(codes, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_corrupt_value_is_serialization_error() {
        let store = store();
        store
            .backend()
            .put(&Partition::new("skus"), b"bad", b"not json")
            .unwrap();
        assert!(matches!(
            store.get(&"bad".to_string()),
            Err(StorageError::SerializationError(_))
        ));
    }

    #[tokio::test]
    async fn test_async_variants() {
        let store = store();
        let key = "A-1".to_string();
        assert!(store.put_if_absent_async(&key, &sku("A-1", 3)).await.unwrap());
        assert_eq!(store.get_async(&key).await.unwrap(), Some(sku("A-1", 3)));

        store.put_async(&"B-2".to_string(), &sku("B-2", 1)).await.unwrap();
        assert_eq!(store.scan_all_async(Some(1)).await.unwrap().len(), 1);
        assert_eq!(store.scan_all_async(None).await.unwrap().len(), 2);

        store.delete_async(&key).await.unwrap();
        assert_eq!(store.get_async(&key).await.unwrap(), None);
    }
}
