//! DuckDB analytics service
//!
//! Embedded analytical store, the default backend. Opens a database file (or
//! an in-memory database when no path is configured) and creates the trace,
//! observation and score tables on first start.

mod executor;
pub mod schema;
mod sql_types;

use std::path::PathBuf;
use std::time::Duration;

use duckdb::Connection;
use parking_lot::Mutex;

use crate::core::config::DuckdbConfig;
use crate::core::constants::DUCKDB_QUERY_TIMEOUT_SECS;
use crate::data::error::DataError;

/// DuckDB analytics service
///
/// Holds one connection protected by a mutex. Queries run on a cloned
/// connection inside `spawn_blocking`, so the mutex is only held while
/// cloning.
pub struct DuckdbService {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
    timeout_secs: u64,
}

impl DuckdbService {
    /// Initialize the analytics service with a single connection
    pub async fn init(config: &DuckdbConfig) -> Result<Self, DataError> {
        let path = config.path.clone();
        if let Some(parent) = path.as_ref().and_then(|p| p.parent())
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let open_path = path.clone();
        let conn = tokio::task::spawn_blocking(move || {
            let conn = match open_path {
                Some(ref p) => Connection::open(p)?,
                None => Connection::open_in_memory()?,
            };
            conn.execute_batch(
                "SET autoinstall_known_extensions = false;
                 SET autoload_known_extensions = false;
                 LOAD json;",
            )?;
            conn.execute_batch(schema::SCHEMA)?;
            Ok::<_, duckdb::Error>(conn)
        })
        .await
        .map_err(|e| DataError::Io(std::io::Error::other(e)))??;

        match path {
            Some(ref p) => tracing::debug!(path = %p.display(), "DuckdbService initialized"),
            None => tracing::debug!("DuckdbService initialized (in-memory)"),
        }

        Ok(Self {
            conn: Mutex::new(conn),
            path,
            timeout_secs: DUCKDB_QUERY_TIMEOUT_SECS,
        })
    }

    /// Open an in-memory database with the analytics schema
    pub async fn open_in_memory() -> Result<Self, DataError> {
        Self::init(&DuckdbConfig::default()).await
    }

    /// Database file path (`None` for in-memory)
    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    /// Run a blocking closure on a cloned connection with timeout
    pub async fn run_query<T, F>(&self, f: F) -> Result<T, DataError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, DataError> + Send + 'static,
    {
        let conn = self.conn.lock().try_clone()?;
        let timeout_secs = self.timeout_secs;
        tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            tokio::task::spawn_blocking(move || f(&conn)),
        )
        .await
        .map_err(|_| {
            tracing::warn!("DuckDB query timed out after {}s", timeout_secs);
            DataError::timeout("duckdb", timeout_secs)
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "DuckDB query task failed");
            DataError::Io(std::io::Error::other(format!(
                "Query execution failed: {}",
                e
            )))
        })?
    }

    /// Execute a batch of statements (schema setup, fixtures)
    pub async fn execute_batch(&self, sql: impl Into<String>) -> Result<(), DataError> {
        let sql = sql.into();
        self.run_query(move |conn| conn.execute_batch(&sql).map_err(DataError::from))
            .await
    }
}
