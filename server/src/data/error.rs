//! Unified error type for data layer
//!
//! This module provides a unified error type that can represent errors from
//! all analytics backends (DuckDB, PostgreSQL, ClickHouse).

use thiserror::Error;

/// Unified error type for data layer operations
///
/// This error type wraps backend-specific errors while preserving context
/// about which backend generated the error. It never reaches API callers;
/// the query service logs it and answers with a generic failure.
#[derive(Error, Debug)]
pub enum DataError {
    /// PostgreSQL database error
    #[error("PostgreSQL error: {0}")]
    Postgres(sqlx::Error),

    /// DuckDB database error
    #[error("DuckDB error: {0}")]
    Duckdb(#[from] duckdb::Error),

    /// ClickHouse database error
    #[error("ClickHouse error: {0}")]
    Clickhouse(#[from] clickhouse::error::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Query timeout
    #[error("Query timeout after {timeout_secs}s on {backend}")]
    Timeout {
        backend: &'static str,
        timeout_secs: u64,
    },

    /// A result row could not be converted to JSON
    #[error("Row decode failed on {backend}: {message}")]
    RowDecode {
        backend: &'static str,
        message: String,
    },
}

impl DataError {
    /// Create a PostgreSQL error with preserved context
    pub fn from_postgres(e: sqlx::Error) -> Self {
        Self::Postgres(e)
    }

    /// Create a timeout error
    pub fn timeout(backend: &'static str, timeout_secs: u64) -> Self {
        Self::Timeout {
            backend,
            timeout_secs,
        }
    }

    /// Create a row decode error
    pub fn row_decode(backend: &'static str, message: impl Into<String>) -> Self {
        Self::RowDecode {
            backend,
            message: message.into(),
        }
    }

    /// Get the backend name that generated this error
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Duckdb(_) => "duckdb",
            Self::Clickhouse(_) => "clickhouse",
            Self::Timeout { backend, .. } => backend,
            Self::RowDecode { backend, .. } => backend,
            Self::Config(_) | Self::Io(_) => "unknown",
        }
    }
}
