//! Storage backend abstraction.
//!
//! A `StorageBackend` is an ordered key-value store split into named
//! partitions. Backends map partitions to their native concept:
//! - **RocksDB**: Partition = Column Family
//! - **In-Memory**: Partition = `BTreeMap` namespace
//!
//! Dynamic models use one partition per collection, so `partition_exists` is
//! the collection-existence query behind collision checks.

use std::fmt;
use std::sync::Arc;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Boxed iterator of `(key, value)` pairs returned by `scan`.
pub type KvIterator<'a> = Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Partition (column family, namespace) not found
    PartitionNotFound(String),

    /// Generic I/O error from underlying storage
    IoError(String),

    /// Serialization/deserialization error
    SerializationError(String),

    /// Operation not supported by this backend
    Unsupported(String),

    /// Unique constraint violation
    UniqueConstraintViolation(String),

    /// Other errors
    Other(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::PartitionNotFound(p) => write!(f, "Partition not found: {}", p),
            StorageError::IoError(msg) => write!(f, "I/O error: {}", msg),
            StorageError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            StorageError::Unsupported(msg) => write!(f, "Unsupported operation: {}", msg),
            StorageError::UniqueConstraintViolation(msg) => {
                write!(f, "Unique constraint violation: {}", msg)
            }
            StorageError::Other(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// A logical partition of data within a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Partition {
    name: String,
}

impl Partition {
    /// Creates a new partition with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the partition name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<String> for Partition {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&str> for Partition {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Trait for pluggable storage backend implementations.
///
/// Implementations must be thread-safe (Send + Sync) to allow concurrent access.
///
/// Implementations should:
/// - Return `PartitionNotFound` if the partition doesn't exist
/// - Return `IoError` for underlying storage failures
/// - Return `Unsupported` for operations not supported by the backend
pub trait StorageBackend: Send + Sync {
    /// Retrieves a value by key. Returns `Ok(None)` if the key doesn't exist.
    fn get(&self, partition: &Partition, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Stores a key-value pair, replacing any existing value.
    fn put(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()>;

    /// Stores a key-value pair only if the key is absent.
    ///
    /// The check and the write are atomic with respect to other
    /// `put_if_absent` calls on the same backend. Returns `Ok(false)` and
    /// leaves the stored value untouched when the key already exists.
    fn put_if_absent(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<bool>;

    /// Deletes a key. Returns `Ok(())` even if the key doesn't exist (idempotent).
    fn delete(&self, partition: &Partition, key: &[u8]) -> Result<()>;

    /// Scans keys in a partition in ascending key order.
    ///
    /// - `prefix`: If Some, only return keys starting with this prefix
    /// - `start_key`: If Some, start scanning from this key (inclusive)
    /// - `limit`: If Some, return at most this many entries
    fn scan(
        &self,
        partition: &Partition,
        prefix: Option<&[u8]>,
        start_key: Option<&[u8]>,
        limit: Option<usize>,
    ) -> Result<KvIterator<'_>>;

    /// Checks if a partition exists.
    fn partition_exists(&self, partition: &Partition) -> bool;

    /// Creates a new partition. Returns `Ok(())` if it already exists.
    fn create_partition(&self, partition: &Partition) -> Result<()>;
}

fn join_error(e: tokio::task::JoinError) -> StorageError {
    StorageError::Other(format!("spawn_blocking join error: {}", e))
}

/// Async versions of the `StorageBackend` methods.
///
/// Each call runs the synchronous backend method on the blocking thread pool
/// through `tokio::task::spawn_blocking`, so storage I/O never parks an async
/// worker.
#[async_trait::async_trait]
pub trait StorageBackendAsync: Send + Sync {
    async fn get_async(&self, partition: &Partition, key: &[u8]) -> Result<Option<Vec<u8>>>;

    async fn put_async(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()>;

    async fn put_if_absent_async(
        &self,
        partition: &Partition,
        key: &[u8],
        value: &[u8],
    ) -> Result<bool>;

    async fn delete_async(&self, partition: &Partition, key: &[u8]) -> Result<()>;

    /// Returns collected results since iterators can't cross the
    /// `spawn_blocking` boundary.
    async fn scan_async(
        &self,
        partition: &Partition,
        prefix: Option<Vec<u8>>,
        start_key: Option<Vec<u8>>,
        limit: Option<usize>,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    async fn partition_exists_async(&self, partition: &Partition) -> Result<bool>;

    async fn create_partition_async(&self, partition: &Partition) -> Result<()>;
}

#[async_trait::async_trait]
impl StorageBackendAsync for Arc<dyn StorageBackend> {
    async fn get_async(&self, partition: &Partition, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let backend = self.clone();
        let partition = partition.clone();
        let key = key.to_vec();
        tokio::task::spawn_blocking(move || backend.get(&partition, &key))
            .await
            .map_err(join_error)?
    }

    async fn put_async(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()> {
        let backend = self.clone();
        let partition = partition.clone();
        let key = key.to_vec();
        let value = value.to_vec();
        tokio::task::spawn_blocking(move || backend.put(&partition, &key, &value))
            .await
            .map_err(join_error)?
    }

    async fn put_if_absent_async(
        &self,
        partition: &Partition,
        key: &[u8],
        value: &[u8],
    ) -> Result<bool> {
        let backend = self.clone();
        let partition = partition.clone();
        let key = key.to_vec();
        let value = value.to_vec();
        tokio::task::spawn_blocking(move || backend.put_if_absent(&partition, &key, &value))
            .await
            .map_err(join_error)?
    }

    async fn delete_async(&self, partition: &Partition, key: &[u8]) -> Result<()> {
        let backend = self.clone();
        let partition = partition.clone();
        let key = key.to_vec();
        tokio::task::spawn_blocking(move || backend.delete(&partition, &key))
            .await
            .map_err(join_error)?
    }

    async fn scan_async(
        &self,
        partition: &Partition,
        prefix: Option<Vec<u8>>,
        start_key: Option<Vec<u8>>,
        limit: Option<usize>,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let backend = self.clone();
        let partition = partition.clone();
        tokio::task::spawn_blocking(move || {
            let iter = backend.scan(&partition, prefix.as_deref(), start_key.as_deref(), limit)?;
            Ok(iter.collect())
        })
        .await
        .map_err(join_error)?
    }

    async fn partition_exists_async(&self, partition: &Partition) -> Result<bool> {
        let backend = self.clone();
        let partition = partition.clone();
        tokio::task::spawn_blocking(move || backend.partition_exists(&partition))
            .await
            .map_err(join_error)
    }

    async fn create_partition_async(&self, partition: &Partition) -> Result<()> {
        let backend = self.clone();
        let partition = partition.clone();
        tokio::task::spawn_blocking(move || backend.create_partition(&partition))
            .await
            .map_err(join_error)?
    }
}
