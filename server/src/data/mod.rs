//! Data storage layer
//!
//! Provides the analytics stores the query service runs against:
//! - `duckdb` - Embedded analytics database (default)
//! - `postgres` - Row store for deployments that keep traces in PostgreSQL
//! - `clickhouse` - Columnar store for high-volume deployments
//! - `sql` - SQL dialects, typed parameters and compiled queries
//! - `traits` - Executor trait shared by all backends
//! - `error` - Unified error type for all backends

pub mod clickhouse;
pub mod duckdb;
pub mod error;
pub mod postgres;
pub mod sql;
pub mod traits;

// Re-export backend-specific services
pub use clickhouse::ClickhouseService;
pub use duckdb::DuckdbService;
pub use postgres::PostgresService;

// Re-export unified error type
pub use error::DataError;

pub use traits::{QueryExecutor, QueryRow};

use std::sync::Arc;

use crate::core::config::{AnalyticsBackend, DatabaseConfig};
use sql::Backend;

/// Analytics database service enum
///
/// Wraps the underlying backend-specific service (DuckDB, PostgreSQL or
/// ClickHouse). Services are stored as Arc so the executor can be handed to
/// the query service while the app keeps a handle for shutdown.
pub enum AnalyticsService {
    /// DuckDB backend (default, embedded)
    Duckdb(Arc<DuckdbService>),
    /// PostgreSQL backend
    Postgres(Arc<PostgresService>),
    /// ClickHouse backend (for distributed deployments)
    Clickhouse(Arc<ClickhouseService>),
}

impl AnalyticsService {
    /// Initialize the analytics service based on configuration
    pub async fn init(config: &DatabaseConfig) -> Result<Self, DataError> {
        match config.analytics {
            AnalyticsBackend::Duckdb => {
                let service = DuckdbService::init(&config.duckdb).await?;
                Ok(Self::Duckdb(Arc::new(service)))
            }
            AnalyticsBackend::Postgres => {
                let pg = config.postgres.as_ref().ok_or_else(|| {
                    DataError::Config("PostgreSQL configuration required".to_string())
                })?;
                let service = PostgresService::init(pg).await?;
                Ok(Self::Postgres(Arc::new(service)))
            }
            AnalyticsBackend::Clickhouse => {
                let ch = config.clickhouse.as_ref().ok_or_else(|| {
                    DataError::Config("ClickHouse configuration required".to_string())
                })?;
                let service = ClickhouseService::init(ch).await?;
                Ok(Self::Clickhouse(Arc::new(service)))
            }
        }
    }

    /// Get the backend type
    pub fn backend(&self) -> Backend {
        match self {
            Self::Duckdb(_) => Backend::Duckdb,
            Self::Postgres(_) => Backend::Postgres,
            Self::Clickhouse(_) => Backend::Clickhouse,
        }
    }

    /// Executor for compiled queries
    pub fn executor(&self) -> Arc<dyn QueryExecutor> {
        match self {
            Self::Duckdb(s) => s.clone(),
            Self::Postgres(s) => s.clone(),
            Self::Clickhouse(s) => s.clone(),
        }
    }

    /// Close connections gracefully
    pub async fn close(&self) {
        match self {
            Self::Duckdb(_) => tracing::debug!("DuckDB connection released"),
            Self::Postgres(s) => s.close().await,
            Self::Clickhouse(s) => s.close().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_duckdb_default() {
        let config = DatabaseConfig::default();
        let service = AnalyticsService::init(&config).await.unwrap();
        assert_eq!(service.backend(), Backend::Duckdb);
        assert_eq!(service.executor().backend(), Backend::Duckdb);
        service.close().await;
    }

    #[tokio::test]
    async fn test_init_postgres_requires_config() {
        let config = DatabaseConfig {
            analytics: AnalyticsBackend::Postgres,
            ..Default::default()
        };
        let err = AnalyticsService::init(&config).await.err().unwrap();
        assert!(err.to_string().contains("PostgreSQL configuration required"));
    }
}
