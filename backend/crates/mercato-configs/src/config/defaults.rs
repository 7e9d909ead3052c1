// Default value functions

pub fn default_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_port() -> u16 {
    8080
}

pub fn default_workers() -> usize {
    0 // 0 = one worker per physical core (actix default)
}

pub fn default_true() -> bool {
    true
}

pub fn default_storage_backend() -> String {
    "memory".to_string()
}

pub fn default_data_path() -> String {
    "./data".to_string()
}

pub fn default_rocksdb_write_buffer_size() -> usize {
    2 * 1024 * 1024
}

pub fn default_rocksdb_max_write_buffers() -> i32 {
    2
}

pub fn default_rocksdb_block_cache_size() -> usize {
    4 * 1024 * 1024
}

pub fn default_rocksdb_max_background_jobs() -> i32 {
    4
}

pub fn default_rocksdb_max_open_files() -> i32 {
    512
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_logs_path() -> String {
    "./logs".to_string()
}

pub fn default_log_format() -> String {
    "compact".to_string()
}

pub fn default_max_body_size() -> usize {
    1048576 // 1MB
}

pub fn default_query_limit() -> usize {
    50
}

pub fn default_max_query_limit() -> usize {
    1000
}

pub fn default_keepalive_timeout() -> u64 {
    75
}

pub fn default_client_request_timeout() -> u64 {
    5
}

pub fn default_shutdown_timeout() -> u64 {
    30
}

pub fn default_cors_methods() -> Vec<String> {
    ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

pub fn default_cors_headers() -> Vec<String> {
    ["Content-Type", "Accept", "Origin", "X-Requested-With"]
        .iter()
        .map(|h| h.to_string())
        .collect()
}

pub fn default_cors_max_age() -> usize {
    3600 // 1 hour
}
