use axum::{extract::State, response::IntoResponse, routing::get, Router};
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

use crate::server::ServerState;

/// Struct for managing server health metrics: active connections, message
/// counts and completed games.
#[derive(Clone)]
pub struct HealthMetrics {
    /// Tracks the number of active connections.
    pub connections: IntGauge,
    /// Counts the total number of messages received by the server.
    pub messages_received: IntCounter,
    /// Counts the total number of messages sent by the server.
    pub messages_sent: IntCounter,
    /// Counts games that reached a terminal outcome (win, draw or
    /// disconnect tie).
    pub games_completed: IntCounter,
    /// Prometheus registry used to store and manage the metrics.
    registry: Registry,
}

impl Default for HealthMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthMetrics {
    /// Creates a new instance of `HealthMetrics` and registers the metrics
    /// with Prometheus.
    pub fn new() -> Self {
        let registry = Registry::new();
        let connections = IntGauge::new("connections", "Active connections").unwrap();
        let messages_received =
            IntCounter::new("messages_received", "Total messages received").unwrap();
        let messages_sent = IntCounter::new("messages_sent", "Total messages sent").unwrap();
        let games_completed = IntCounter::new("games_completed", "Games completed").unwrap();

        registry.register(Box::new(connections.clone())).unwrap();
        registry
            .register(Box::new(messages_received.clone()))
            .unwrap();
        registry.register(Box::new(messages_sent.clone())).unwrap();
        registry
            .register(Box::new(games_completed.clone()))
            .unwrap();

        Self {
            connections,
            messages_received,
            messages_sent,
            games_completed,
            registry,
        }
    }

    /// Exposes the current state of all registered metrics in
    /// Prometheus-compatible format.
    pub fn expose_metrics(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }
}

/// Starts an HTTP server exposing the `/metrics` endpoint on the configured
/// metrics port.
pub async fn serve_metrics_http(state: Arc<ServerState>) {
    let addr = format!("0.0.0.0:{}", state.config.metrics_port);
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(state);

    axum::Server::bind(&addr.parse().expect("valid metrics address"))
        .serve(app.into_make_service())
        .await
        .expect("metrics server failed");
}

/// Handles the `/metrics` HTTP request and returns the current metrics data.
async fn metrics_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    state.metrics.expose_metrics()
}
