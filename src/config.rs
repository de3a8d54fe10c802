use config::Config;
use serde::Deserialize;

use crate::utils::error::ServerError;

/// Configuration settings for the session server.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// The address on which the server will listen.
    pub host: String,
    /// The port on which the server will listen (0 picks an ephemeral port).
    pub port: u16,
    /// The maximum number of simultaneous connections allowed.
    pub max_connections: usize,
    /// The maximum number of connection attempts per second per source IP.
    pub connection_rate_limit: u32,
    /// The port serving the Prometheus `/metrics` endpoint.
    pub metrics_port: u16,
}

impl ServerConfig {
    /// Loads the server configuration from environment variables.
    ///
    /// Environment variables are prefixed with `THREEROW_`; anything unset
    /// falls back to a default, so an unconfigured server runs.
    ///
    /// # Errors
    /// Returns a `ServerError::Configuration` if the configuration cannot be
    /// loaded or deserialized.
    pub fn from_env() -> Result<Self, ServerError> {
        Config::builder()
            .set_default("host", "0.0.0.0")
            .map_err(|e| ServerError::Configuration(e.to_string()))?
            .set_default("port", 65432)
            .map_err(|e| ServerError::Configuration(e.to_string()))?
            .set_default("max_connections", 64)
            .map_err(|e| ServerError::Configuration(e.to_string()))?
            .set_default("connection_rate_limit", 10)
            .map_err(|e| ServerError::Configuration(e.to_string()))?
            .set_default("metrics_port", 9080)
            .map_err(|e| ServerError::Configuration(e.to_string()))?
            .add_source(config::Environment::with_prefix("THREEROW"))
            .build()
            .map_err(|e| ServerError::Configuration(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ServerError::Configuration(e.to_string()))
    }

    /// Validates the configuration settings.
    ///
    /// # Errors
    /// Returns a `ServerError::Configuration` if a limit is zero.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.max_connections == 0 {
            return Err(ServerError::Configuration(
                "max_connections must be greater than 0".into(),
            ));
        }
        if self.connection_rate_limit == 0 {
            return Err(ServerError::Configuration(
                "connection_rate_limit must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
