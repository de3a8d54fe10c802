// src/server/mod.rs
pub mod client;
pub mod handler;
pub mod health;
pub mod message;
pub mod middleware;
pub mod registry;

// Re-export public components
pub use client::{Client, ClientManager};
pub use handler::handle_connection;
pub use health::HealthMetrics;
pub use message::{ClientMessage, ServerMessage};
pub use middleware::rate_limit::ConnectionRateLimiter;
pub use registry::SeatRegistry;

// Import internal dependencies
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::config::ServerConfig;
use crate::game::SessionState;

/// The shared game session behind the single lock: board state plus the
/// seat bookkeeping. Every logical transition (join, move, disconnect
/// cleanup) happens inside one critical section over this value.
#[derive(Debug, Default)]
pub struct SharedSession {
    pub state: SessionState,
    pub seats: SeatRegistry,
}

pub struct ServerState {
    pub config: Arc<ServerConfig>,
    pub clients: ClientManager,
    pub session: Mutex<SharedSession>,
    pub metrics: HealthMetrics,
    pub rate_limiter: ConnectionRateLimiter,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        let rate_limiter = ConnectionRateLimiter::new(config.connection_rate_limit);
        ServerState {
            config: Arc::new(config),
            clients: ClientManager::new(),
            session: Mutex::new(SharedSession::default()),
            metrics: HealthMetrics::new(),
            rate_limiter,
        }
    }
}

/// Accepts incoming connections and spawns one coordinator task per
/// participant. Runs until the listener fails or the task is dropped by the
/// shutdown select in `main`.
pub async fn run(listener: TcpListener, state: Arc<ServerState>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = state.clone();
                tokio::spawn(async move {
                    state.rate_limiter.check(addr.ip()).await;

                    if state.clients.len() >= state.config.max_connections {
                        warn!("Connection limit reached, refusing {}", addr);
                        refuse(stream).await;
                        return;
                    }

                    if let Err(e) = handler::handle_connection(stream, state, addr).await {
                        error!("Connection error for {}: {}", addr, e);
                    }
                });
            }
            Err(e) => error!("Accept error: {}", e),
        }
    }
}

/// Tells an over-capacity peer why it is being dropped, best effort.
async fn refuse(mut stream: tokio::net::TcpStream) {
    use tokio::io::AsyncWriteExt;

    if let Ok(line) = message::encode(&ServerMessage::error("server is full")) {
        let _ = stream.write_all(format!("{line}\n").as_bytes()).await;
    }
    let _ = stream.shutdown().await;
}
