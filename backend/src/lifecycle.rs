//! Server lifecycle management helpers.
//!
//! Bootstraps the storage engine and the application context, wires the HTTP
//! server, and coordinates graceful shutdown.

use crate::middleware;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use log::{debug, info, warn};
use mercato_api::routes::{configure_routes, json_config, query_config};
use mercato_configs::ServerConfig;
use mercato_core::AppContext;
use mercato_store::{InMemoryBackend, StorageBackend};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Opens the storage engine selected by `storage.backend`.
pub fn open_storage(config: &ServerConfig) -> Result<Arc<dyn StorageBackend>> {
    match config.storage.backend.as_str() {
        "memory" => {
            warn!("Using in-memory storage: schemas and documents are lost on restart");
            Ok(Arc::new(InMemoryBackend::new()))
        }
        "rocksdb" => open_rocksdb(config),
        other => Err(anyhow::anyhow!("Unknown storage backend '{}'", other)),
    }
}

#[cfg(feature = "rocksdb")]
fn open_rocksdb(config: &ServerConfig) -> Result<Arc<dyn StorageBackend>> {
    use mercato_store::{RocksDBBackend, RocksDbInit};

    let phase_start = Instant::now();
    let db_path = config.storage.rocksdb_dir();
    std::fs::create_dir_all(&db_path)?;

    let (db, column_families) =
        RocksDbInit::new(db_path.clone(), config.storage.rocksdb.clone()).open()?;
    info!(
        "RocksDB initialized at {} with {} column families ({:.2}ms)",
        db_path.display(),
        column_families.len(),
        phase_start.elapsed().as_secs_f64() * 1000.0
    );
    if !config.storage.rocksdb.sync_writes {
        debug!("RocksDB async writes enabled (sync_writes=false)");
    }

    Ok(Arc::new(RocksDBBackend::with_sync_writes(
        db,
        config.storage.rocksdb.sync_writes,
    )))
}

#[cfg(not(feature = "rocksdb"))]
fn open_rocksdb(_config: &ServerConfig) -> Result<Arc<dyn StorageBackend>> {
    Err(anyhow::anyhow!(
        "storage.backend = \"rocksdb\" requires a build with `--features rocksdb`"
    ))
}

/// Opens storage and builds the application context, compiling every
/// persisted model.
pub async fn bootstrap(config: &ServerConfig) -> Result<Arc<AppContext>> {
    let bootstrap_start = Instant::now();
    let backend = open_storage(config)?;

    let app_context = AppContext::init(backend, config.clone()).await?;
    info!(
        "AppContext ready in {:.2}ms ({} model(s) cached)",
        bootstrap_start.elapsed().as_secs_f64() * 1000.0,
        app_context.schema_registry().cache().len()
    );

    Ok(app_context)
}

/// Start the HTTP server and manage graceful shutdown.
pub async fn run(
    config: &ServerConfig,
    app_context: Arc<AppContext>,
    main_start: Instant,
) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting HTTP server on {}", bind_addr);
    debug!("Endpoints: /healthz, /readyz, /schemas, /{{modelName}}, /{{modelName}}/{{id}}");

    info!(
        "Server config: workers={}, body_limit={}KB, query_limit={}/{}",
        if config.server.workers == 0 {
            "auto".to_string()
        } else {
            config.server.workers.to_string()
        },
        config.limits.max_body_size / 1024,
        config.limits.default_query_limit,
        config.limits.max_query_limit
    );

    let cors_config = config.clone();
    let max_body_size = config.limits.max_body_size;
    let app_context_for_handler = Arc::clone(&app_context);

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::request_logger())
            .wrap(middleware::build_cors_from_config(&cors_config))
            .app_data(web::Data::new(Arc::clone(&app_context_for_handler)))
            .app_data(json_config(max_body_size))
            .app_data(query_config())
            .configure(configure_routes)
    })
    // Connections stay open for reuse between requests
    .keep_alive(Duration::from_secs(config.performance.keepalive_timeout))
    // Client must send request headers within this time
    .client_request_timeout(Duration::from_secs(
        config.performance.client_request_timeout,
    ))
    .shutdown_timeout(config.performance.shutdown_timeout);

    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    let server = server.bind(&bind_addr)?.run();
    info!(
        "Server started in {:.2}ms",
        main_start.elapsed().as_secs_f64() * 1000.0
    );

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Err(e)) => log::error!("Server stopped with error: {}", e),
                Err(e) => log::error!("Server task failed: {}", e),
                Ok(Ok(())) => {}
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, initiating graceful shutdown...");

            // Stop accepting new HTTP connections, let in-flight requests finish
            server_handle.stop(true).await;
        }
    }

    app_context.shutdown();
    drop(app_context);

    info!("Server shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_storage_memory() {
        let config = ServerConfig::default();
        let backend = open_storage(&config).unwrap();
        let partition = mercato_store::Partition::new("widgets");
        backend.create_partition(&partition).unwrap();
        assert!(backend.partition_exists(&partition));
    }

    #[test]
    fn test_open_storage_rejects_unknown_backend() {
        let mut config = ServerConfig::default();
        config.storage.backend = "postgres".to_string();
        assert!(open_storage(&config).is_err());
    }

    #[cfg(not(feature = "rocksdb"))]
    #[test]
    fn test_rocksdb_requires_feature() {
        let mut config = ServerConfig::default();
        config.storage.backend = "rocksdb".to_string();
        let err = open_storage(&config).err().unwrap();
        assert!(err.to_string().contains("--features rocksdb"));
    }

    #[actix_web::test]
    async fn test_bootstrap_with_defaults() {
        let config = ServerConfig::default();
        let ctx = bootstrap(&config).await.unwrap();
        assert!(!ctx.is_shut_down());
        assert_eq!(ctx.config().server.port, config.server.port);
    }
}
