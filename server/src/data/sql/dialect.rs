//! SQL dialect trait for multi-database support
//!
//! This trait defines the interface for generating database-specific SQL syntax.
//! Every method receives identifiers that come from the schema registry and
//! placeholders produced by [`ParamBinder`](super::ParamBinder); none of them
//! ever sees caller-supplied values.

use super::{ParamType, TimeBucket};

/// SQL dialect trait for generating database-specific SQL
///
/// Different databases have different syntax for:
/// - Parameter placeholders (? vs $1 vs {p1:String})
/// - Time truncation and percentiles
/// - JSON map and array lookups
/// - Relations built from bound values
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - DuckDB: Always returns "?"
    /// - PostgreSQL: Returns "$1", "$2", etc.
    /// - ClickHouse: Returns "{p1:String}"
    fn placeholder(&self, index: usize) -> String;

    /// Generate a placeholder that carries the parameter's type
    fn typed_placeholder(&self, index: usize, _ty: ParamType) -> String {
        self.placeholder(index)
    }

    /// Quote an identifier (output alias)
    fn quote_identifier(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Reference a table with its alias in a FROM clause
    fn table_ref(&self, table: &str, alias: &str) -> String {
        format!("{} {}", table, alias)
    }

    /// Generate a LEFT JOIN scoped to the tenant
    ///
    /// `on` is the rendered join condition, `tenant` the tenant placeholder.
    fn join(&self, table: &str, alias: &str, on: &str, tenant_column: &str, tenant: &str) -> String {
        format!(
            "LEFT JOIN {} {} ON {} AND {}.{} = {}",
            table, alias, on, alias, tenant_column, tenant
        )
    }

    /// Truncate a timestamp expression to the start of its bucket
    fn truncate_time(&self, expr: &str, bucket: TimeBucket) -> String;

    /// Continuous percentile of an expression (`q` in 0..1)
    fn percentile(&self, expr: &str, q: f64) -> String;

    /// Extract a string value from a JSON/map column by a bound key
    fn json_extract_string(&self, col: &str, key: &str) -> String;

    /// Convert a caller key into the parameter value expected by
    /// [`json_extract_string`](Self::json_extract_string)
    fn json_key(&self, key: &str) -> String {
        key.to_string()
    }

    /// Generate SQL for checking if an array contains a bound value
    ///
    /// - DuckDB: `array_contains(col, ?)`
    /// - PostgreSQL: `$1 = ANY(col)`
    /// - ClickHouse: `has(col, {p1:String})`
    fn array_contains(&self, array_col: &str, value: &str) -> String;

    /// Generate a LIKE predicate against a bound, already escaped pattern
    fn like(&self, expr: &str, pattern: &str, negated: bool) -> String {
        let op = if negated { "NOT LIKE" } else { "LIKE" };
        format!("{} {} {} ESCAPE '\\'", expr, op, pattern)
    }

    /// Calculate duration in milliseconds between two timestamps
    ///
    /// - DuckDB: `DATE_DIFF('millisecond', start, end)`
    /// - PostgreSQL: `(EXTRACT(EPOCH FROM (end - start)) * 1000)`
    /// - ClickHouse: `dateDiff('millisecond', start, end)`
    fn duration_ms(&self, start: &str, end: &str) -> String;

    /// Build a single-column relation from bound timestamp placeholders
    fn bucket_relation(&self, values: &[String], alias: &str, column: &str) -> String {
        let rows = values
            .iter()
            .map(|v| format!("({})", v))
            .collect::<Vec<_>>()
            .join(", ");
        format!("(VALUES {}) AS {}({})", rows, alias, column)
    }

    /// Wrap a numeric aggregate so every store returns a plain float
    fn numeric_result(&self, expr: &str) -> String {
        expr.to_string()
    }

    /// Generate ORDER BY clause with NULL handling
    fn order_by_with_nulls(&self, col: &str, desc: bool, nulls_last: bool) -> String {
        let dir = if desc { "DESC" } else { "ASC" };
        let nulls = if nulls_last {
            "NULLS LAST"
        } else {
            "NULLS FIRST"
        };
        format!("{} {} {}", col, dir, nulls)
    }

    /// Generate LIMIT/OFFSET clause from bound placeholders
    fn limit_offset(&self, limit: &str, offset: &str) -> String {
        format!("LIMIT {} OFFSET {}", limit, offset)
    }
}
