//! HTTP server for cargowatch
//!
//! Provides the shipment REST API and, when enabled, runs the progression
//! sweep in the background.

pub mod routes;
pub mod state;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::sweep;
use routes::create_router;
use state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Start the HTTP server
///
/// # Arguments
/// * `config` - Server configuration
///
/// # Returns
/// Never returns unless the server shuts down
pub async fn run(config: Config) -> Result<()> {
    let addr = config.server_addr();
    run_on(&addr, config).await
}

/// Start the HTTP server with a specific address
///
/// Useful for tests or when you want to override config
pub async fn run_on(addr: &str, config: Config) -> Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| Error::Server(format!("Invalid server address: {}", e)))?;

    let sweep_config = config.sweep.clone();
    let interval = config.sweep_interval();
    let state = Arc::new(AppState::from_config(config).await?);
    info!(
        "Loaded {} shipments from {}",
        state.store.len().await,
        state.store.path().display()
    );

    if sweep_config.enabled {
        tokio::spawn(sweep::run(
            Arc::clone(&state.store),
            Arc::clone(&state.tracker),
            interval,
            sweep_config.max_concurrency,
        ));
    }

    let app = create_router(state);

    info!("Starting server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Server(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Server(format!("Server error: {}", e)))?;

    Ok(())
}
