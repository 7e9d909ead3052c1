//! RocksDB implementation of the StorageBackend trait.
//!
//! Partitions map to column families. The database is opened in multi-threaded
//! mode so column families can be created through a shared handle.

use crate::storage_trait::{KvIterator, Partition, Result, StorageBackend, StorageError};
use parking_lot::Mutex;
use rocksdb::{
    BoundColumnFamily, Direction, IteratorMode, MultiThreaded, Options, WriteOptions,
};
use std::sync::Arc;

/// Multi-threaded RocksDB handle.
pub type RocksDb = rocksdb::DBWithThreadMode<MultiThreaded>;

/// RocksDB-backed storage.
pub struct RocksDBBackend {
    db: Arc<RocksDb>,
    sync_writes: bool,
    /// Serializes check-then-write sequences (`put_if_absent`).
    write_lock: Mutex<()>,
}

impl RocksDBBackend {
    /// Creates a new RocksDB backend with the given database handle.
    pub fn new(db: Arc<RocksDb>) -> Self {
        Self::with_sync_writes(db, false)
    }

    /// Creates a backend that fsyncs the WAL on every write when `sync_writes`.
    pub fn with_sync_writes(db: Arc<RocksDb>, sync_writes: bool) -> Self {
        Self {
            db,
            sync_writes,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns a reference to the underlying database.
    pub fn db(&self) -> &Arc<RocksDb> {
        &self.db
    }

    fn get_cf(&self, partition: &Partition) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(partition.name())
            .ok_or_else(|| StorageError::PartitionNotFound(partition.name().to_string()))
    }

    fn write_options(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.sync_writes);
        opts
    }
}

fn io_error(e: rocksdb::Error) -> StorageError {
    StorageError::IoError(e.to_string())
}

impl StorageBackend for RocksDBBackend {
    fn get(&self, partition: &Partition, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.get_cf(partition)?;
        self.db.get_cf(&cf, key).map_err(io_error)
    }

    fn put(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self.get_cf(partition)?;
        self.db
            .put_cf_opt(&cf, key, value, &self.write_options())
            .map_err(io_error)
    }

    fn put_if_absent(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<bool> {
        let cf = self.get_cf(partition)?;
        let _guard = self.write_lock.lock();
        if self.db.get_pinned_cf(&cf, key).map_err(io_error)?.is_some() {
            return Ok(false);
        }
        self.db
            .put_cf_opt(&cf, key, value, &self.write_options())
            .map_err(io_error)?;
        Ok(true)
    }

    fn delete(&self, partition: &Partition, key: &[u8]) -> Result<()> {
        let cf = self.get_cf(partition)?;
        self.db
            .delete_cf_opt(&cf, key, &self.write_options())
            .map_err(io_error)
    }

    fn scan(
        &self,
        partition: &Partition,
        prefix: Option<&[u8]>,
        start_key: Option<&[u8]>,
        limit: Option<usize>,
    ) -> Result<KvIterator<'_>> {
        let cf = self.get_cf(partition)?;

        let mode = match (start_key, prefix) {
            (Some(start), _) => IteratorMode::From(start, Direction::Forward),
            (None, Some(p)) => IteratorMode::From(p, Direction::Forward),
            (None, None) => IteratorMode::Start,
        };

        let mut rows = Vec::new();
        for item in self.db.iterator_cf(&cf, mode) {
            if limit.is_some_and(|l| rows.len() >= l) {
                break;
            }
            let (k, v) = item.map_err(io_error)?;
            if let Some(p) = prefix {
                if !k.starts_with(p) {
                    break;
                }
            }
            rows.push((k.to_vec(), v.to_vec()));
        }

        Ok(Box::new(rows.into_iter()))
    }

    fn partition_exists(&self, partition: &Partition) -> bool {
        self.db.cf_handle(partition.name()).is_some()
    }

    fn create_partition(&self, partition: &Partition) -> Result<()> {
        if self.partition_exists(partition) {
            return Ok(());
        }

        match self.db.create_cf(partition.name(), &Options::default()) {
            Ok(()) => Ok(()),
            Err(e) => {
                let msg = e.to_string();
                // Benign race: another thread created the CF between check and create
                if msg.to_ascii_lowercase().contains("column family already exists") {
                    return Ok(());
                }
                Err(StorageError::IoError(msg))
            }
        }
    }

}
