//! # Chat Summary Gateway
//!
//! Entry point for the gateway process.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file, then `CSG_*` environment overrides)
//! 2. Initialize logging from the resolved configuration
//! 3. Build backend clients (HTTP, or fixed local data when no URL is set)
//! 4. Serve until ctrl-c, then drain in-flight requests

use anyhow::Result;
use gateway_runtime::{init_tracing, load_config, CONFIG_DIR};
use std::path::Path;
use summary_gateway::{adapters, GatewayService, VERSION};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let loaded = load_config(Path::new(CONFIG_DIR), |key| std::env::var(key).ok())?;
    init_tracing(&loaded.config.logging)?;

    match &loaded.source {
        Some(path) => info!(path = %path.display(), "Loaded configuration"),
        None => info!("No configuration file found, using defaults"),
    }

    let config = loaded.config;
    let http = adapters::http_client(config.http.keep_alive)?;
    let clients = adapters::build_clients(&config.backends, &http)?;
    let service = GatewayService::new(config, clients)?;

    info!(version = VERSION, "Starting chat summary gateway. Press Ctrl+C to stop.");
    service.start(shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, draining requests"),
        Err(e) => {
            // No signal handler; run until the process is killed
            error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}
