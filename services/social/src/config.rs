//! Server configuration
//!
//! Loaded with the `config` crate from built-in defaults overlaid by
//! `SOCIAL_`-prefixed environment variables, e.g. `SOCIAL_PORT=8080`.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Which storage adapter backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Storage adapter
    pub store_backend: StoreBackend,
    /// Maximum number of suggested users returned
    pub suggestion_limit: usize,
}

impl ServerConfig {
    /// Load configuration from defaults and the environment
    ///
    /// # Environment Variables
    /// - `SOCIAL_HOST` (default: `0.0.0.0`)
    /// - `SOCIAL_PORT` (default: `3002`)
    /// - `SOCIAL_STORE_BACKEND`: `postgres` or `memory` (default: `postgres`)
    /// - `SOCIAL_SUGGESTION_LIMIT` (default: `10`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3002)?
            .set_default("store_backend", "postgres")?
            .set_default("suggestion_limit", 10)?
            .add_source(Environment::with_prefix("SOCIAL").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Socket address string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
