use super::defaults::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub limits: LimitsSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub performance: PerformanceSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub cors: CorsSettings,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
            cors: CorsSettings::default(),
        }
    }
}

/// CORS configuration that maps directly to actix-cors options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins. Empty or ["*"] allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    #[serde(default = "default_cors_methods")]
    pub allowed_methods: Vec<String>,

    #[serde(default = "default_cors_headers")]
    pub allowed_headers: Vec<String>,

    /// Preflight cache max age in seconds
    #[serde(default = "default_cors_max_age")]
    pub max_age: usize,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allowed_methods: default_cors_methods(),
            allowed_headers: default_cors_headers(),
            max_age: default_cors_max_age(),
        }
    }
}

/// Storage engine selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// `memory` or `rocksdb`
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Root data directory (RocksDB lives in `data_path/rocksdb`)
    #[serde(default = "default_data_path")]
    pub data_path: String,

    #[serde(default)]
    pub rocksdb: RocksDbSettings,
}

impl StorageSettings {
    /// RocksDB directory path (data_path/rocksdb)
    pub fn rocksdb_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_path).join("rocksdb")
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            data_path: default_data_path(),
            rocksdb: RocksDbSettings::default(),
        }
    }
}

/// RocksDB tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDbSettings {
    /// Write buffer size per column family in bytes (default: 2MB)
    #[serde(default = "default_rocksdb_write_buffer_size")]
    pub write_buffer_size: usize,

    #[serde(default = "default_rocksdb_max_write_buffers")]
    pub max_write_buffers: i32,

    /// Block cache size in bytes, shared across all column families (default: 4MB)
    #[serde(default = "default_rocksdb_block_cache_size")]
    pub block_cache_size: usize,

    #[serde(default = "default_rocksdb_max_background_jobs")]
    pub max_background_jobs: i32,

    /// -1 for unlimited
    #[serde(default = "default_rocksdb_max_open_files")]
    pub max_open_files: i32,

    /// fsync the WAL on every write
    #[serde(default)]
    pub sync_writes: bool,

    #[serde(default)]
    pub compact_on_startup: bool,
}

impl Default for RocksDbSettings {
    fn default() -> Self {
        Self {
            write_buffer_size: default_rocksdb_write_buffer_size(),
            max_write_buffers: default_rocksdb_max_write_buffers(),
            block_cache_size: default_rocksdb_block_cache_size(),
            max_background_jobs: default_rocksdb_max_background_jobs(),
            max_open_files: default_rocksdb_max_open_files(),
            sync_writes: false,
            compact_on_startup: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsSettings {
    /// Maximum JSON request body in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Documents returned by a list call without `limit`
    #[serde(default = "default_query_limit")]
    pub default_query_limit: usize,

    #[serde(default = "default_max_query_limit")]
    pub max_query_limit: usize,
}

impl Default for LimitsSettings {
    fn default() -> Self {
        Self {
            max_body_size: default_max_body_size(),
            default_query_limit: default_query_limit(),
            max_query_limit: default_max_query_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for `server.log`
    #[serde(default = "default_logs_path")]
    pub logs_path: String,

    #[serde(default = "default_true")]
    pub log_to_console: bool,

    /// `compact`, `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Per-target overrides, e.g. `mercato_core = "debug"`
    #[serde(default)]
    pub targets: HashMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            logs_path: default_logs_path(),
            log_to_console: true,
            format: default_log_format(),
            targets: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSettings {
    /// Keep-alive timeout in seconds
    #[serde(default = "default_keepalive_timeout")]
    pub keepalive_timeout: u64,

    /// Seconds a client has to send request headers
    #[serde(default = "default_client_request_timeout")]
    pub client_request_timeout: u64,

    /// Graceful shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            keepalive_timeout: default_keepalive_timeout(),
            client_request_timeout: default_client_request_timeout(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}
