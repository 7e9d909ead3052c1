//! In-memory implementation of the StorageBackend trait.
//!
//! Partitions are `BTreeMap`s so scans come back in key order, matching the
//! RocksDB backend. Nothing survives a restart.

use crate::storage_trait::{KvIterator, Partition, Result, StorageBackend, StorageError};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

type PartitionData = BTreeMap<Vec<u8>, Vec<u8>>;

/// Ordered in-memory backend used by tests and `storage.backend = "memory"`.
#[derive(Default)]
pub struct InMemoryBackend {
    partitions: RwLock<HashMap<String, PartitionData>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn missing(partition: &Partition) -> StorageError {
        StorageError::PartitionNotFound(partition.name().to_string())
    }
}

impl StorageBackend for InMemoryBackend {
    fn get(&self, partition: &Partition, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let guard = self.partitions.read();
        let data = guard
            .get(partition.name())
            .ok_or_else(|| Self::missing(partition))?;
        Ok(data.get(key).cloned())
    }

    fn put(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()> {
        let mut guard = self.partitions.write();
        let data = guard
            .get_mut(partition.name())
            .ok_or_else(|| Self::missing(partition))?;
        data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn put_if_absent(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<bool> {
        let mut guard = self.partitions.write();
        let data = guard
            .get_mut(partition.name())
            .ok_or_else(|| Self::missing(partition))?;
        if data.contains_key(key) {
            return Ok(false);
        }
        data.insert(key.to_vec(), value.to_vec());
        Ok(true)
    }

    fn delete(&self, partition: &Partition, key: &[u8]) -> Result<()> {
        let mut guard = self.partitions.write();
        let data = guard
            .get_mut(partition.name())
            .ok_or_else(|| Self::missing(partition))?;
        data.remove(key);
        Ok(())
    }

    fn scan(
        &self,
        partition: &Partition,
        prefix: Option<&[u8]>,
        start_key: Option<&[u8]>,
        limit: Option<usize>,
    ) -> Result<KvIterator<'_>> {
        let guard = self.partitions.read();
        let data = guard
            .get(partition.name())
            .ok_or_else(|| Self::missing(partition))?;

        let lower = match (start_key, prefix) {
            (Some(start), _) => Bound::Included(start.to_vec()),
            (None, Some(p)) => Bound::Included(p.to_vec()),
            (None, None) => Bound::Unbounded,
        };

        // Snapshot the matching range so the read lock is not held by the iterator.
        let rows: Vec<(Vec<u8>, Vec<u8>)> = data
            .range((lower, Bound::Unbounded))
            .take_while(|(k, _)| prefix.map_or(true, |p| k.starts_with(p)))
            .take(limit.unwrap_or(usize::MAX))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Box::new(rows.into_iter()))
    }

    fn partition_exists(&self, partition: &Partition) -> bool {
        self.partitions.read().contains_key(partition.name())
    }

    fn create_partition(&self, partition: &Partition) -> Result<()> {
        self.partitions
            .write()
            .entry(partition.name().to_string())
            .or_default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_with(partition: &str) -> (InMemoryBackend, Partition) {
        let backend = InMemoryBackend::new();
        let partition = Partition::new(partition);
        backend.create_partition(&partition).unwrap();
        (backend, partition)
    }

    #[test]
    fn test_put_and_get() {
        let (backend, partition) = backend_with("widgets");
        backend.put(&partition, b"key1", b"value1").unwrap();
        assert_eq!(
            backend.get(&partition, b"key1").unwrap(),
            Some(b"value1".to_vec())
        );
        assert_eq!(backend.get(&partition, b"missing").unwrap(), None);
    }

    #[test]
    fn test_missing_partition() {
        let backend = InMemoryBackend::new();
        let partition = Partition::new("nope");
        assert_eq!(
            backend.put(&partition, b"k", b"v"),
            Err(StorageError::PartitionNotFound("nope".to_string()))
        );
        assert!(backend.get(&partition, b"k").is_err());
    }

    #[test]
    fn test_put_if_absent() {
        let (backend, partition) = backend_with("system_schemas");
        assert!(backend.put_if_absent(&partition, b"Widget", b"v1").unwrap());
        assert!(!backend.put_if_absent(&partition, b"Widget", b"v2").unwrap());
        assert_eq!(
            backend.get(&partition, b"Widget").unwrap(),
            Some(b"v1".to_vec())
        );
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (backend, partition) = backend_with("widgets");
        backend.put(&partition, b"key1", b"value1").unwrap();
        backend.delete(&partition, b"key1").unwrap();
        backend.delete(&partition, b"key1").unwrap();
        assert_eq!(backend.get(&partition, b"key1").unwrap(), None);
    }

    #[test]
    fn test_scan_prefix_start_and_limit() {
        let (backend, partition) = backend_with("widgets");
        for key in ["admin:1", "user:1", "user:2", "user:3", "zeta"] {
            backend.put(&partition, key.as_bytes(), b"v").unwrap();
        }

        fn keys(rows: KvIterator<'_>) -> Vec<String> {
            rows.map(|(k, _)| String::from_utf8(k).unwrap()).collect()
        }

        let all = keys(backend.scan(&partition, None, None, None).unwrap());
        assert_eq!(all, vec!["admin:1", "user:1", "user:2", "user:3", "zeta"]);

        let users = keys(backend.scan(&partition, Some(b"user:"), None, None).unwrap());
        assert_eq!(users, vec!["user:1", "user:2", "user:3"]);

        let from = keys(
            backend
                .scan(&partition, Some(b"user:"), Some(b"user:2"), Some(1))
                .unwrap(),
        );
        assert_eq!(from, vec!["user:2"]);
    }

    #[test]
    fn test_partition_lifecycle() {
        let backend = InMemoryBackend::new();
        backend.create_partition(&Partition::new("widgets")).unwrap();
        backend.create_partition(&Partition::new("categories")).unwrap();
        backend.create_partition(&Partition::new("widgets")).unwrap();

        assert!(backend.partition_exists(&Partition::new("widgets")));
        assert!(backend.partition_exists(&Partition::new("categories")));
        assert!(!backend.partition_exists(&Partition::new("brands")));
    }
}
