//! Helpers for building isolated contexts in tests.
//!
//! Every call returns a fresh context over its own in-memory backend, so tests
//! never share registry or cache state.

use crate::app_context::AppContext;
use mercato_configs::ServerConfig;
use mercato_store::test_utils::memory_backend;
use mercato_store::StorageBackend;
use std::sync::Arc;

/// Initialized context over a fresh in-memory backend with default config.
pub async fn test_app_context() -> Arc<AppContext> {
    test_app_context_with(memory_backend()).await
}

/// Initialized context over `backend`.
///
/// Panics if initialization fails; only meant for tests.
pub async fn test_app_context_with(backend: Arc<dyn StorageBackend>) -> Arc<AppContext> {
    AppContext::init(backend, ServerConfig::default())
        .await
        .unwrap_or_else(|e| panic!("failed to initialize test AppContext: {}", e))
}
