//! SQL type conversions for DuckDB
//!
//! Binds [`QueryValue`] parameters and converts result values to JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use duckdb::ToSql;
use duckdb::types::{TimeUnit, ToSqlOutput, Value, ValueRef};
use serde_json::Value as JsonValue;

use crate::data::sql::QueryValue;

impl ToSql for QueryValue {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        Ok(match self {
            QueryValue::String(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            QueryValue::Int(i) => ToSqlOutput::Owned(Value::BigInt(*i)),
            QueryValue::Float(f) => ToSqlOutput::Owned(Value::Double(*f)),
            QueryValue::Bool(b) => ToSqlOutput::Owned(Value::Boolean(*b)),
            // Placeholders are wrapped in CAST(? AS TIMESTAMP)
            QueryValue::DateTime(dt) => {
                let ts = dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string();
                ToSqlOutput::Owned(Value::Text(ts))
            }
        })
    }
}

/// Convert a DuckDB result value to JSON
///
/// Timestamps are naive UTC in the schema and come back as RFC 3339 strings
/// with millisecond precision.
pub fn value_to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(b),
        Value::TinyInt(i) => JsonValue::from(i),
        Value::SmallInt(i) => JsonValue::from(i),
        Value::Int(i) => JsonValue::from(i),
        Value::BigInt(i) => JsonValue::from(i),
        Value::HugeInt(i) => i64::try_from(i)
            .map(JsonValue::from)
            .unwrap_or_else(|_| float_to_json(i as f64)),
        Value::UTinyInt(i) => JsonValue::from(i),
        Value::USmallInt(i) => JsonValue::from(i),
        Value::UInt(i) => JsonValue::from(i),
        Value::UBigInt(i) => JsonValue::from(i),
        Value::Float(f) => float_to_json(f as f64),
        Value::Double(f) => float_to_json(f),
        Value::Decimal(d) => d
            .to_string()
            .parse::<f64>()
            .map(float_to_json)
            .unwrap_or(JsonValue::Null),
        Value::Timestamp(unit, raw) => timestamp_to_json(unit, raw),
        Value::Text(s) | Value::Enum(s) => JsonValue::String(s),
        Value::List(items) | Value::Array(items) => {
            JsonValue::Array(items.into_iter().map(value_to_json).collect())
        }
        _ => JsonValue::Null,
    }
}

fn float_to_json(f: f64) -> JsonValue {
    serde_json::Number::from_f64(f)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

fn timestamp_to_json(unit: TimeUnit, raw: i64) -> JsonValue {
    let micros = match unit {
        TimeUnit::Second => raw.saturating_mul(1_000_000),
        TimeUnit::Millisecond => raw.saturating_mul(1_000),
        TimeUnit::Microsecond => raw,
        TimeUnit::Nanosecond => raw / 1_000,
    };
    DateTime::<Utc>::from_timestamp_micros(micros)
        .map(|dt| JsonValue::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)))
        .unwrap_or(JsonValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_to_json_scalars() {
        assert_eq!(value_to_json(Value::Null), JsonValue::Null);
        assert_eq!(value_to_json(Value::BigInt(42)), json!(42));
        assert_eq!(value_to_json(Value::HugeInt(8)), json!(8));
        assert_eq!(value_to_json(Value::Double(1.5)), json!(1.5));
        assert_eq!(value_to_json(Value::Double(f64::NAN)), JsonValue::Null);
        assert_eq!(value_to_json(Value::Boolean(true)), json!(true));
        assert_eq!(value_to_json(Value::Text("gpt-4".into())), json!("gpt-4"));
    }

    #[test]
    fn test_timestamp_to_json() {
        // 2021-01-01T00:00:00Z
        let micros = 1_609_459_200_000_000;
        assert_eq!(
            value_to_json(Value::Timestamp(TimeUnit::Microsecond, micros)),
            json!("2021-01-01T00:00:00.000Z")
        );
        assert_eq!(
            value_to_json(Value::Timestamp(TimeUnit::Second, 1_609_459_200)),
            json!("2021-01-01T00:00:00.000Z")
        );
    }

    #[test]
    fn test_list_to_json() {
        let list = Value::List(vec![Value::Text("a".into()), Value::Text("b".into())]);
        assert_eq!(value_to_json(list), json!(["a", "b"]));
    }

    #[test]
    fn test_datetime_param_binds_as_text() {
        let dt = DateTime::parse_from_rfc3339("2021-01-02T03:04:05.123456Z")
            .unwrap()
            .with_timezone(&Utc);
        let value = QueryValue::DateTime(dt);
        let out = value.to_sql().unwrap();
        match out {
            ToSqlOutput::Owned(Value::Text(s)) => assert_eq!(s, "2021-01-02 03:04:05.123456"),
            _ => panic!("expected text output"),
        }
    }
}
