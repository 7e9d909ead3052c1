//! # mercato-store
//!
//! Storage engine boundary for Mercato. Every dynamic model writes into its own
//! partition (a "collection"); schema definitions live in the well-known
//! `system_schemas` partition.
//!
//! ## Architecture
//!
//! ```text
//! mercato-core (registry, model cache, documents)
//!     ↓
//! EntityStore<K, V> / StorageBackendAsync
//!     ↓
//! StorageBackend (InMemoryBackend | RocksDBBackend)
//! ```

pub mod entity_store;
pub mod memory_impl;
#[cfg(feature = "rocksdb")]
pub mod rocksdb_impl;
#[cfg(feature = "rocksdb")]
pub mod rocksdb_init;
pub mod storage_trait;
pub mod test_utils;

pub use entity_store::{EntityStore, EntityStoreAsync};
pub use memory_impl::InMemoryBackend;
#[cfg(feature = "rocksdb")]
pub use rocksdb_impl::RocksDBBackend;
#[cfg(feature = "rocksdb")]
pub use rocksdb_init::RocksDbInit;
pub use storage_trait::{
    KvIterator, Partition, StorageBackend, StorageBackendAsync, StorageError,
};

pub use mercato_commons::StorageKey;
