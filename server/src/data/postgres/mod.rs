//! PostgreSQL analytics service
//!
//! Runs analytical queries against a row store that already holds the
//! `traces`, `observations` and `scores` tables. Schema management for
//! that database lives outside this service.

mod executor;

pub use sqlx::PgPool;

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::core::config::PostgresConfig;
use crate::core::constants::{
    POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS, POSTGRES_DEFAULT_MAX_CONNECTIONS,
    POSTGRES_DEFAULT_MIN_CONNECTIONS, POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS,
};
use crate::data::error::DataError;

/// PostgreSQL analytics service
///
/// Should be created once at server startup and shared across all modules.
pub struct PostgresService {
    pool: PgPool,
}

impl PostgresService {
    /// Initialize the connection pool from configuration
    ///
    /// Every connection runs in UTC with a statement timeout, so runaway
    /// aggregations are cancelled by the server.
    pub async fn init(config: &PostgresConfig) -> Result<Self, DataError> {
        let url = config.url.as_str();
        if url.is_empty() {
            return Err(DataError::Config("PostgreSQL URL is required".into()));
        }

        let max_connections = if config.max_connections > 0 {
            config.max_connections
        } else {
            POSTGRES_DEFAULT_MAX_CONNECTIONS
        };

        let statement_timeout = if config.statement_timeout_secs > 0 {
            config.statement_timeout_secs
        } else {
            POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS
        };

        let options: PgConnectOptions = url
            .parse()
            .map_err(|e| DataError::Config(format!("Invalid PostgreSQL URL: {}", e)))?;
        let options = options.options([
            ("statement_timeout", format!("{}s", statement_timeout)),
            ("timezone", "UTC".to_string()),
        ]);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(POSTGRES_DEFAULT_MIN_CONNECTIONS.min(max_connections))
            .acquire_timeout(Duration::from_secs(POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS))
            .connect_with(options)
            .await
            .map_err(DataError::from_postgres)?;

        tracing::debug!(
            max_connections,
            statement_timeout_secs = statement_timeout,
            "PostgresService initialized"
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("PostgreSQL pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_requires_url() {
        let config = PostgresConfig::default();
        let err = PostgresService::init(&config).await.err().unwrap();
        assert!(matches!(err, DataError::Config(_)));
    }

    #[tokio::test]
    async fn test_init_rejects_invalid_url() {
        let config = PostgresConfig {
            url: "not a url".to_string(),
            ..Default::default()
        };
        let err = PostgresService::init(&config).await.err().unwrap();
        assert!(err.to_string().contains("Invalid PostgreSQL URL"));
    }
}
