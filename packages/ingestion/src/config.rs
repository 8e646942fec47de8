//! Store configuration loaded from environment variables.
//!
//! Configuration is read once at startup and handed to an explicitly
//! constructed store; the library keeps no process-global connection
//! state.

use dotenvy::dotenv;
use std::env;

use crate::error::{IngestError, Result};

/// Connection settings for a database-backed store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| IngestError::Config("DATABASE_URL must be set".into()))?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| {
                    IngestError::Config("DATABASE_MAX_CONNECTIONS must be a valid number".into())
                })?,
        })
    }

    /// Build a configuration for the given database URL.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 10,
        }
    }

    /// Set the connection pool size.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}
