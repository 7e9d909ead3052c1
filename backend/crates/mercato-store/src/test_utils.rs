//! Test utilities for mercato-store.
//!
//! Used by the unit tests here and by dependent crates' integration tests.

use crate::memory_impl::InMemoryBackend;
use crate::storage_trait::{KvIterator, Partition, Result, StorageBackend, StorageError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Fresh in-memory backend behind the trait object every store expects.
pub fn memory_backend() -> Arc<dyn StorageBackend> {
    Arc::new(InMemoryBackend::new())
}

/// In-memory backend whose writes can be switched to fail.
///
/// Reads keep working, so tests can check that a failed write left no
/// partial state behind.
#[derive(Default)]
pub struct FaultyBackend {
    inner: InMemoryBackend,
    fail_writes: AtomicBool,
    write_calls: AtomicUsize,
}

impl FaultyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with `IoError` (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of write calls attempted so far.
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    fn check_write(&self) -> Result<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::IoError("injected write failure".to_string()));
        }
        Ok(())
    }
}

impl StorageBackend for FaultyBackend {
    fn get(&self, partition: &Partition, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.inner.get(partition, key)
    }

    fn put(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_write()?;
        self.inner.put(partition, key, value)
    }

    fn put_if_absent(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<bool> {
        self.check_write()?;
        self.inner.put_if_absent(partition, key, value)
    }

    fn delete(&self, partition: &Partition, key: &[u8]) -> Result<()> {
        self.check_write()?;
        self.inner.delete(partition, key)
    }

    fn scan(
        &self,
        partition: &Partition,
        prefix: Option<&[u8]>,
        start_key: Option<&[u8]>,
        limit: Option<usize>,
    ) -> Result<KvIterator<'_>> {
        self.inner.scan(partition, prefix, start_key, limit)
    }

    fn partition_exists(&self, partition: &Partition) -> bool {
        self.inner.partition_exists(partition)
    }

    fn create_partition(&self, partition: &Partition) -> Result<()> {
        self.check_write()?;
        self.inner.create_partition(partition)
    }
}
