//! Configuration management

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/drs";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default cumulative byte size after which an ingest batch is committed.
pub const DEFAULT_COMMIT_THRESHOLD_BYTES: u64 = 100 * 1024 * 1024;

/// Default size above which a manifest source file is ignored.
pub const DEFAULT_IGNORE_ABOVE_BYTES: u64 = 200 * 1024 * 1024;

/// Default number of records a worker processes per reporting batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub database: DatabaseConfig,
    pub ingest: IngestConfig,

    /// How many records downstream workers mark processed in one batch.
    pub batch_size: usize,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// Blob ingestion tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub commit_threshold: u64,
    pub ignore_above: u64,
}

impl StoreConfig {
    /// Load configuration from environment and defaults
    pub fn load() -> StoreResult<Self> {
        dotenvy::dotenv().ok();

        let config = StoreConfig {
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
                min_connections: std::env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_MIN_CONNECTIONS),
                connect_timeout_secs: std::env::var("DATABASE_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS),
                idle_timeout_secs: std::env::var("DATABASE_IDLE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_IDLE_TIMEOUT_SECS),
            },
            ingest: IngestConfig {
                commit_threshold: std::env::var("DRS_COMMIT_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_COMMIT_THRESHOLD_BYTES),
                ignore_above: std::env::var("DRS_IGNORE_ABOVE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_IGNORE_ABOVE_BYTES),
            },
            batch_size: std::env::var("DRS_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_BATCH_SIZE),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> StoreResult<()> {
        if self.database.url.is_empty() {
            return Err(StoreError::Config("Database URL cannot be empty".to_string()));
        }

        if self.database.max_connections == 0 {
            return Err(StoreError::Config(
                "Database max_connections must be greater than 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(StoreError::Config(format!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }

        if self.ingest.commit_threshold == 0 {
            return Err(StoreError::Config(
                "Ingest commit_threshold must be greater than 0".to_string(),
            ));
        }

        if self.ingest.ignore_above == 0 {
            return Err(StoreError::Config(
                "Ingest ignore_above must be greater than 0".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(StoreError::Config("batch_size must be greater than 0".to_string()));
        }

        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            ingest: IngestConfig {
                commit_threshold: DEFAULT_COMMIT_THRESHOLD_BYTES,
                ignore_above: DEFAULT_IGNORE_ABOVE_BYTES,
            },
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.min_connections, 2);
        assert_eq!(config.ingest.commit_threshold, 100 * 1024 * 1024);
        assert_eq!(config.ingest.ignore_above, 200 * 1024 * 1024);
        assert_eq!(config.batch_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let mut config = StoreConfig::default();
        config.database.url = String::new();
        assert!(matches!(config.validate(), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_inverted_pool_bounds() {
        let mut config = StoreConfig::default();
        config.database.min_connections = 20;
        assert!(matches!(config.validate(), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_thresholds() {
        let mut config = StoreConfig::default();
        config.ingest.commit_threshold = 0;
        assert!(matches!(config.validate(), Err(StoreError::Config(_))));

        let mut config = StoreConfig::default();
        config.ingest.ignore_above = 0;
        assert!(matches!(config.validate(), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let mut config = StoreConfig::default();
        config.batch_size = 0;
        assert!(matches!(config.validate(), Err(StoreError::Config(_))));
    }
}
