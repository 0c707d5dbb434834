//! Executor trait for analytics backends
//!
//! Each backend (DuckDB, PostgreSQL, ClickHouse) runs compiled queries with
//! its own driver and returns rows as JSON maps keyed by output column name.

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::sql::{Backend, CompiledQuery};

/// One result row, keyed by output column name in SELECT order
pub type QueryRow = serde_json::Map<String, serde_json::Value>;

/// Runs compiled analytical queries against a store
///
/// Implementations bind `query.params` in order (positional stores) or by
/// their `p{i}` names (named stores) and never alter `query.sql`.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute a compiled query and return its rows
    async fn execute(&self, query: &CompiledQuery) -> Result<Vec<QueryRow>, DataError>;

    /// Round-trip a trivial statement to confirm the store is reachable
    async fn health_check(&self) -> Result<(), DataError>;

    /// Backend this executor talks to
    fn backend(&self) -> Backend;
}
