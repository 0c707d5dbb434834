//! Query executor for DuckDB

use async_trait::async_trait;
use duckdb::params_from_iter;
use duckdb::types::Value;

use super::DuckdbService;
use super::sql_types::value_to_json;
use crate::data::error::DataError;
use crate::data::sql::{Backend, CompiledQuery};
use crate::data::traits::{QueryExecutor, QueryRow};

#[async_trait]
impl QueryExecutor for DuckdbService {
    async fn execute(&self, query: &CompiledQuery) -> Result<Vec<QueryRow>, DataError> {
        let query = query.clone();
        self.run_query(move |conn| {
            let names = query.column_names();
            let mut stmt = conn.prepare(&query.sql)?;
            let mut rows = stmt.query(params_from_iter(query.params.iter()))?;

            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut map = QueryRow::new();
                for (index, name) in names.iter().enumerate() {
                    let value = row.get::<usize, Value>(index)?;
                    map.insert(name.clone(), value_to_json(value));
                }
                out.push(map);
            }
            Ok(out)
        })
        .await
    }

    async fn health_check(&self) -> Result<(), DataError> {
        self.run_query(|conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))
                .map_err(DataError::from)
        })
        .await
    }

    fn backend(&self) -> Backend {
        Backend::Duckdb
    }
}
