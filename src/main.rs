//! # threerow server
//!
//! Entry point for the session server: loads configuration from the
//! environment, binds the TCP listener, spawns the metrics endpoint and
//! runs the accept loop until a shutdown signal arrives.
//!
//! ## Dependencies
//! - `tokio` for the asynchronous runtime
//! - `dotenv` for environment configuration
//! - `tracing` for logging

use std::sync::Arc;

use threerow::server::{self, health};
use threerow::{config, ServerState};
use tokio::{net::TcpListener, signal};
use tracing::info;

/// Initializes logging, loads configuration from the environment, and
/// starts the TCP listener.
///
/// # Errors
/// Returns an error if configuration validation fails or if the server
/// fails to bind to a port.
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let _ = dotenv::dotenv();
    tracing_subscriber::fmt::init();

    let config = config::ServerConfig::from_env()?;
    config.validate()?;

    let state = Arc::new(ServerState::new(config));

    let listener =
        TcpListener::bind(format!("{}:{}", state.config.host, state.config.port)).await?;
    info!("Server listening on {}", listener.local_addr()?);

    tokio::spawn(health::serve_metrics_http(state.clone()));

    // Handle incoming connections or shutdown signals
    tokio::select! {
        _ = server::run(listener, state.clone()) => {},
        _ = shutdown_signal() => {
            info!("Shutting down gracefully");
            state.clients.cleanup();
        }
    }

    Ok(())
}

/// Listens for a shutdown signal (Ctrl+C) and initiates a graceful
/// shutdown.
async fn shutdown_signal() {
    signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
}
