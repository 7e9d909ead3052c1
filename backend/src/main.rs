// Mercato Server entrypoint
//!
//! Initialization, middleware wiring and graceful shutdown live in dedicated
//! modules so this file remains a thin orchestrator.

use anyhow::Result;
use clap::Parser;
use log::info;
use mercato_configs::ServerConfig;
use mercato_server::{lifecycle, logging};
use std::path::PathBuf;

/// Mercato storefront backend with runtime-defined document models.
#[derive(Debug, Parser)]
#[command(name = "mercato-server", version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[actix_web::main]
async fn main() -> Result<()> {
    let main_start = std::time::Instant::now();
    let args = Args::parse();

    // Load configuration (fallback to defaults when config file missing)
    let config_found = args.config.exists();
    let mut config = ServerConfig::load_or_default(&args.config).map_err(|e| {
        eprintln!("FATAL: Failed to load {}: {}", args.config.display(), e);
        e
    })?;
    config.apply_env_overrides()?;
    config.finalize()?;

    // Logging before any other side effects
    let server_log_path = format!("{}/server.log", config.logging.logs_path);
    logging::init_logging(
        &config.logging.level,
        &server_log_path,
        config.logging.log_to_console,
        Some(&config.logging.targets),
        &config.logging.format,
    )?;

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let build_date = env!("BUILD_DATE");
    let branch = env!("GIT_BRANCH");

    info!("╔═══════════════════════════════════════════════════════════════╗");
    info!("║           Mercato Server v{:<36} ║", version);
    info!("╠═══════════════════════════════════════════════════════════════╣");
    info!("║  Commit:     {:<49} ║", commit);
    info!("║  Branch:     {:<49} ║", branch);
    info!("║  Built:      {:<49} ║", build_date);
    info!("╚═══════════════════════════════════════════════════════════════╝");
    if config_found {
        info!("Loaded config from: {}", args.config.display());
    } else {
        log::warn!(
            "Config file '{}' not found, running with defaults",
            args.config.display()
        );
    }
    info!(
        "Host: {}  Port: {}  Storage: {}",
        config.server.host, config.server.port, config.storage.backend
    );

    let app_context = lifecycle::bootstrap(&config).await?;

    // Run HTTP server until termination signal is received
    lifecycle::run(&config, app_context, main_start).await
}
