//! PostgreSQL SQL dialect implementation

use super::{ParamType, SqlDialect, TimeBucket};

/// PostgreSQL SQL dialect
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn typed_placeholder(&self, index: usize, ty: ParamType) -> String {
        let sql_type = match ty {
            ParamType::String => "TEXT",
            ParamType::Int => "BIGINT",
            ParamType::Float => "DOUBLE PRECISION",
            ParamType::Bool => "BOOLEAN",
            ParamType::DateTime => "TIMESTAMPTZ",
        };
        format!("CAST(${} AS {})", index, sql_type)
    }

    fn truncate_time(&self, expr: &str, bucket: TimeBucket) -> String {
        format!("date_trunc('{}', {})", bucket.as_str(), expr)
    }

    fn percentile(&self, expr: &str, q: f64) -> String {
        format!("percentile_cont({}) WITHIN GROUP (ORDER BY {})", q, expr)
    }

    fn json_extract_string(&self, col: &str, key: &str) -> String {
        format!("({} ->> {})", col, key)
    }

    fn array_contains(&self, array_col: &str, value: &str) -> String {
        format!("{} = ANY({})", value, array_col)
    }

    fn duration_ms(&self, start: &str, end: &str) -> String {
        format!("(EXTRACT(EPOCH FROM ({} - {})) * 1000)::BIGINT", end, start)
    }

    /// SUM/AVG over BIGINT yield NUMERIC, which the row decoder does not carry
    fn numeric_result(&self, expr: &str) -> String {
        format!("CAST({} AS DOUBLE PRECISION)", expr)
    }
}
