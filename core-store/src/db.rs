//! # Database Connection Pool Module
//!
//! Pool settings shared by the database-backed stream stores.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_store::db::DatabaseConfig;
//!
//! let config = DatabaseConfig::from_server_config(&server_config)
//!     .max_connections(20);
//! let pool = config.pg_pool_options().connect_lazy_with(options);
//! ```

use core_runtime::ServerConfig;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use store_traits::{Result, StoreError};

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Maximum time to wait for a connection from the pool
    pub acquire_timeout: Duration,

    /// Maximum lifetime of a connection
    pub max_lifetime: Option<Duration>,

    /// Maximum idle time for a connection before being closed
    pub idle_timeout: Option<Duration>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            min_connections: 0,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: Some(Duration::from_secs(1800)), // 30 minutes
            idle_timeout: Some(Duration::from_secs(600)),  // 10 minutes
        }
    }
}

impl DatabaseConfig {
    /// Pool settings taken from the server configuration
    pub fn from_server_config(config: &ServerConfig) -> Self {
        Self::default()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
    }

    /// Set the minimum number of connections
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Set the maximum number of connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the connection acquire timeout
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Set the maximum connection lifetime
    pub fn max_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    /// Set the idle timeout
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Postgres pool options carrying these settings
    pub fn pg_pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .min_connections(self.min_connections)
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .max_lifetime(self.max_lifetime)
            .idle_timeout(self.idle_timeout)
    }
}

/// Reject values that do not fit the signed 64-bit columns used for versions.
pub(crate) fn version_to_db(version: u64) -> Result<i64> {
    i64::try_from(version)
        .map_err(|_| StoreError::OperationFailed(format!("Stream version {} out of range", version)))
}

pub(crate) fn version_from_db(version: i64) -> Result<u64> {
    u64::try_from(version).map_err(|_| {
        StoreError::DatabaseError(format!("Negative stream version {} in storage", version))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_runtime::ProviderKind;

    #[test]
    fn test_database_config_builder() {
        let config = DatabaseConfig::default()
            .min_connections(2)
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(None);

        assert_eq!(config.min_connections, 2);
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.idle_timeout, None);
        assert_eq!(config.max_lifetime, Some(Duration::from_secs(1800)));
    }

    #[test]
    fn test_from_server_config() {
        let server = ServerConfig::builder()
            .provider(ProviderKind::Postgres)
            .connection_string("postgres://localhost/streams")
            .max_connections(3)
            .acquire_timeout(Duration::from_secs(7))
            .build()
            .unwrap();

        let config = DatabaseConfig::from_server_config(&server);
        assert_eq!(config.max_connections, 3);
        assert_eq!(config.acquire_timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_version_conversions() {
        assert_eq!(version_to_db(4).unwrap(), 4);
        assert!(version_to_db(u64::MAX).is_err());
        assert_eq!(version_from_db(9).unwrap(), 9);
        assert!(version_from_db(-1).is_err());
    }
}
