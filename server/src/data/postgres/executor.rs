//! Query executor for PostgreSQL

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row, TypeInfo};

use super::PostgresService;
use crate::data::error::DataError;
use crate::data::sql::{Backend, CompiledQuery, QueryValue};
use crate::data::traits::{QueryExecutor, QueryRow};

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &QueryValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        QueryValue::String(s) => query.bind(s.clone()),
        QueryValue::Int(i) => query.bind(*i),
        QueryValue::Float(f) => query.bind(*f),
        QueryValue::Bool(b) => query.bind(*b),
        QueryValue::DateTime(dt) => query.bind(*dt),
    }
}

/// How a result column is turned into JSON, by Postgres type name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnDecode {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Text,
    TimestampTz,
    Timestamp,
    /// Enums, CITEXT and other types whose binary form is UTF-8 text
    TextLike,
}

impl ColumnDecode {
    fn for_type(type_name: &str) -> Self {
        match type_name {
            "BOOL" => Self::Bool,
            "INT2" => Self::Int2,
            "INT4" => Self::Int4,
            "INT8" => Self::Int8,
            "FLOAT4" => Self::Float4,
            "FLOAT8" => Self::Float8,
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => Self::Text,
            "TIMESTAMPTZ" => Self::TimestampTz,
            "TIMESTAMP" => Self::Timestamp,
            _ => Self::TextLike,
        }
    }
}

fn decode_column(row: &PgRow, index: usize) -> Result<JsonValue, sqlx::Error> {
    let value = match ColumnDecode::for_type(row.column(index).type_info().name()) {
        ColumnDecode::Bool => row.try_get::<Option<bool>, _>(index)?.map(JsonValue::from),
        ColumnDecode::Int2 => row.try_get::<Option<i16>, _>(index)?.map(JsonValue::from),
        ColumnDecode::Int4 => row.try_get::<Option<i32>, _>(index)?.map(JsonValue::from),
        ColumnDecode::Int8 => row.try_get::<Option<i64>, _>(index)?.map(JsonValue::from),
        ColumnDecode::Float4 => row
            .try_get::<Option<f32>, _>(index)?
            .and_then(|f| serde_json::Number::from_f64(f as f64))
            .map(JsonValue::Number),
        ColumnDecode::Float8 => row
            .try_get::<Option<f64>, _>(index)?
            .and_then(serde_json::Number::from_f64)
            .map(JsonValue::Number),
        ColumnDecode::Text => row.try_get::<Option<String>, _>(index)?.map(JsonValue::from),
        ColumnDecode::TimestampTz => row
            .try_get::<Option<DateTime<Utc>>, _>(index)?
            .map(|dt| JsonValue::from(dt.to_rfc3339_opts(SecondsFormat::Millis, true))),
        ColumnDecode::Timestamp => row.try_get::<Option<NaiveDateTime>, _>(index)?.map(|dt| {
            JsonValue::from(dt.and_utc().to_rfc3339_opts(SecondsFormat::Millis, true))
        }),
        // String's type check rejects enums; the payload is still the label
        ColumnDecode::TextLike => row
            .try_get_unchecked::<Option<String>, _>(index)?
            .map(JsonValue::from),
    };
    Ok(value.unwrap_or(JsonValue::Null))
}

#[async_trait]
impl QueryExecutor for PostgresService {
    async fn execute(&self, query: &CompiledQuery) -> Result<Vec<QueryRow>, DataError> {
        let mut q = sqlx::query(&query.sql);
        for value in query.params.iter() {
            q = bind_value(q, value);
        }

        let rows = q
            .fetch_all(self.pool())
            .await
            .map_err(DataError::from_postgres)?;

        let names = query.column_names();
        rows.iter()
            .map(|row| {
                let mut map = QueryRow::new();
                for (index, name) in names.iter().enumerate() {
                    let value = decode_column(row, index)
                        .map_err(|e| DataError::row_decode("postgres", e.to_string()))?;
                    map.insert(name.clone(), value);
                }
                Ok(map)
            })
            .collect()
    }

    async fn health_check(&self) -> Result<(), DataError> {
        sqlx::query("SELECT 1")
            .execute(self.pool())
            .await
            .map(|_| ())
            .map_err(DataError::from_postgres)
    }

    fn backend(&self) -> Backend {
        Backend::Postgres
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sqlx::{Arguments, Execute};

    #[test]
    fn test_known_types_decode_natively() {
        assert_eq!(ColumnDecode::for_type("BOOL"), ColumnDecode::Bool);
        assert_eq!(ColumnDecode::for_type("INT8"), ColumnDecode::Int8);
        assert_eq!(ColumnDecode::for_type("FLOAT8"), ColumnDecode::Float8);
        assert_eq!(ColumnDecode::for_type("VARCHAR"), ColumnDecode::Text);
        assert_eq!(ColumnDecode::for_type("TIMESTAMPTZ"), ColumnDecode::TimestampTz);
        assert_eq!(ColumnDecode::for_type("TIMESTAMP"), ColumnDecode::Timestamp);
    }

    #[test]
    fn test_enum_and_citext_decode_as_text() {
        for name in ["ObservationType", "ObservationLevel", "ScoreSource", "CITEXT"] {
            assert_eq!(ColumnDecode::for_type(name), ColumnDecode::TextLike, "{}", name);
        }
    }

    #[test]
    fn test_bind_value_binds_every_param() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let values = [
            QueryValue::String("acme".to_string()),
            QueryValue::Int(7),
            QueryValue::Float(0.5),
            QueryValue::Bool(true),
            QueryValue::DateTime(dt),
        ];
        let mut query = sqlx::query("SELECT $1, $2, $3, $4, $5");
        for value in &values {
            query = bind_value(query, value);
        }
        let args = query.take_arguments().unwrap().unwrap();
        assert_eq!(args.len(), values.len());
    }
}
