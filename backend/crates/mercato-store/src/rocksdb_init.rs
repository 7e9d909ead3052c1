//! RocksDB initialization for Mercato.
//!
//! Opens the database with every column family already on disk, so
//! collections created in earlier runs are visible to collision checks, and
//! makes sure the `system_schemas` partition exists.

use crate::rocksdb_impl::RocksDb;
use anyhow::Result;
use mercato_commons::SYSTEM_SCHEMAS_PARTITION;
use mercato_configs::RocksDbSettings;
use rocksdb::{BlockBasedOptions, Cache, ColumnFamilyDescriptor, Options};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// RocksDB initializer for creating/opening the database.
pub struct RocksDbInit {
    db_path: PathBuf,
    settings: RocksDbSettings,
}

impl RocksDbInit {
    /// Create a new initializer for the given path with custom settings.
    pub fn new(db_path: impl Into<PathBuf>, settings: RocksDbSettings) -> Self {
        Self {
            db_path: db_path.into(),
            settings,
        }
    }

    /// Create a new initializer with default settings.
    pub fn with_defaults(db_path: impl Into<PathBuf>) -> Self {
        Self::new(db_path, RocksDbSettings::default())
    }

    /// Open or create the database. Returns the handle and the column family
    /// names it was opened with.
    pub fn open(&self) -> Result<(Arc<RocksDb>, Vec<String>)> {
        let path: &Path = &self.db_path;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_write_buffer_size(self.settings.write_buffer_size);
        db_opts.set_max_write_buffer_number(self.settings.max_write_buffers);
        db_opts.set_max_background_jobs(self.settings.max_background_jobs);
        db_opts.set_max_open_files(self.settings.max_open_files);

        // Block cache is shared across all column families.
        let cache = Cache::new_lru_cache(self.settings.block_cache_size);
        db_opts.set_block_based_table_factory(&block_options(&cache));

        let mut existing = match RocksDb::list_cf(&db_opts, path) {
            Ok(cfs) if !cfs.is_empty() => cfs,
            _ => vec!["default".to_string()],
        };
        if !existing.iter().any(|n| n == SYSTEM_SCHEMAS_PARTITION) {
            existing.push(SYSTEM_SCHEMAS_PARTITION.to_string());
        }

        let descriptors: Vec<_> = existing
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_write_buffer_size(self.settings.write_buffer_size);
                cf_opts.set_max_write_buffer_number(self.settings.max_write_buffers);
                cf_opts.set_block_based_table_factory(&block_options(&cache));
                ColumnFamilyDescriptor::new(name, cf_opts)
            })
            .collect();

        let db = Arc::new(RocksDb::open_cf_descriptors(&db_opts, path, descriptors)?);
        log::info!(
            "Opened RocksDB at {} with {} column families",
            path.display(),
            existing.len()
        );

        if self.settings.compact_on_startup {
            let start = std::time::Instant::now();
            for name in &existing {
                if let Some(cf) = db.cf_handle(name) {
                    db.compact_range_cf(&cf, None::<&[u8]>, None::<&[u8]>);
                }
            }
            log::info!("Startup compaction completed in {:?}", start.elapsed());
        }

        Ok((db, existing))
    }
}

fn block_options(cache: &Cache) -> BlockBasedOptions {
    let mut block_opts = BlockBasedOptions::default();
    block_opts.set_block_cache(cache);
    block_opts.set_bloom_filter(10.0, false);
    block_opts.set_cache_index_and_filter_blocks(true);
    block_opts
}
