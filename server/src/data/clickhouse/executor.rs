//! Query executor for ClickHouse
//!
//! Values travel as server-side query parameters (`param_p1=...`) and the
//! result is read as `JSONEachRow`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;

use super::ClickhouseService;
use crate::data::error::DataError;
use crate::data::sql::{Backend, ColumnKind, CompiledQuery, QueryValue};
use crate::data::traits::{QueryExecutor, QueryRow};

/// Format a timestamp the way ClickHouse parses `DateTime64` parameters
fn format_datetime_param(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Normalize ISO timestamps to millisecond precision
fn normalize_time(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::String(ref s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| {
                JsonValue::String(
                    dt.with_timezone(&Utc)
                        .to_rfc3339_opts(SecondsFormat::Millis, true),
                )
            })
            .unwrap_or(value),
        other => other,
    }
}

/// Parse a `JSONEachRow` body into rows ordered like `query.columns`
fn parse_rows(body: &[u8], query: &CompiledQuery) -> Result<Vec<QueryRow>, DataError> {
    let mut rows = Vec::new();
    for line in body.split(|b| *b == b'\n') {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let mut raw: QueryRow = serde_json::from_slice(line)
            .map_err(|e| DataError::row_decode("clickhouse", e.to_string()))?;
        let mut row = QueryRow::new();
        for column in &query.columns {
            let value = raw.remove(&column.name).unwrap_or(JsonValue::Null);
            let value = match column.kind {
                ColumnKind::Time => normalize_time(value),
                _ => value,
            };
            row.insert(column.name.clone(), value);
        }
        rows.push(row);
    }
    Ok(rows)
}

#[async_trait]
impl QueryExecutor for ClickhouseService {
    async fn execute(&self, query: &CompiledQuery) -> Result<Vec<QueryRow>, DataError> {
        let mut q = self.client().query(&query.sql);
        for (name, value) in query.params.named() {
            q = match value {
                QueryValue::String(s) => q.param(&name, s.as_str()),
                QueryValue::Int(i) => q.param(&name, *i),
                QueryValue::Float(f) => q.param(&name, *f),
                QueryValue::Bool(b) => q.param(&name, *b),
                QueryValue::DateTime(dt) => q.param(&name, format_datetime_param(dt)),
            };
        }

        let fetch = async {
            let mut cursor = q.fetch_bytes("JSONEachRow")?;
            cursor.collect().await
        };

        let body = tokio::time::timeout(Duration::from_secs(self.timeout_secs), fetch)
            .await
            .map_err(|_| {
                tracing::warn!("ClickHouse query timed out after {}s", self.timeout_secs);
                DataError::timeout("clickhouse", self.timeout_secs)
            })??;

        parse_rows(&body, query)
    }

    async fn health_check(&self) -> Result<(), DataError> {
        self.client()
            .query("SELECT 1")
            .execute()
            .await
            .map_err(DataError::from)
    }

    fn backend(&self) -> Backend {
        Backend::Clickhouse
    }
}
