//! ClickHouse SQL dialect implementation

use super::{ParamType, SqlDialect, TimeBucket};

/// ClickHouse SQL dialect
///
/// Values are passed as server-side query parameters (`{p1:String}`) so the
/// client never interpolates them into the query text.
pub struct ClickhouseDialect;

impl SqlDialect for ClickhouseDialect {
    fn name(&self) -> &'static str {
        "clickhouse"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("{{p{}:String}}", index)
    }

    fn typed_placeholder(&self, index: usize, ty: ParamType) -> String {
        let ch_type = match ty {
            ParamType::String => "String",
            ParamType::Int => "Int64",
            ParamType::Float => "Float64",
            ParamType::Bool => "Bool",
            ParamType::DateTime => "DateTime64(6, 'UTC')",
        };
        format!("{{p{}:{}}}", index, ch_type)
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('\\', "\\\\").replace('`', "\\`"))
    }

    fn table_ref(&self, table: &str, alias: &str) -> String {
        format!("{} AS {}", table, alias)
    }

    /// Joined tables are pre-filtered to the tenant in a subquery
    fn join(&self, table: &str, alias: &str, on: &str, tenant_column: &str, tenant: &str) -> String {
        format!(
            "LEFT JOIN (SELECT * FROM {} WHERE {} = {}) AS {} ON {}",
            table, tenant_column, tenant, alias, on
        )
    }

    fn truncate_time(&self, expr: &str, bucket: TimeBucket) -> String {
        match bucket {
            TimeBucket::Minute => format!("toStartOfMinute({})", expr),
            TimeBucket::Hour => format!("toStartOfHour({})", expr),
            TimeBucket::Day => format!("toStartOfDay({})", expr),
            TimeBucket::Week => format!("toDateTime(toMonday({}), 'UTC')", expr),
            TimeBucket::Month => format!("toDateTime(toStartOfMonth({}), 'UTC')", expr),
        }
    }

    fn percentile(&self, expr: &str, q: f64) -> String {
        format!("quantile({})({})", q, expr)
    }

    fn json_extract_string(&self, col: &str, key: &str) -> String {
        format!("{}[{}]", col, key)
    }

    fn array_contains(&self, array_col: &str, value: &str) -> String {
        format!("has({}, {})", array_col, value)
    }

    /// Backslash is ClickHouse's built-in LIKE escape
    fn like(&self, expr: &str, pattern: &str, negated: bool) -> String {
        let op = if negated { "NOT LIKE" } else { "LIKE" };
        format!("{} {} {}", expr, op, pattern)
    }

    fn duration_ms(&self, start: &str, end: &str) -> String {
        format!("dateDiff('millisecond', {}, {})", start, end)
    }

    fn bucket_relation(&self, values: &[String], alias: &str, column: &str) -> String {
        format!(
            "(SELECT arrayJoin([{}]) AS {}) AS {}",
            values.join(", "),
            column,
            alias
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let dialect = ClickhouseDialect;
        assert_eq!(dialect.placeholder(1), "{p1:String}");
        assert_eq!(dialect.typed_placeholder(5, ParamType::Int), "{p5:Int64}");
        assert_eq!(
            dialect.typed_placeholder(2, ParamType::DateTime),
            "{p2:DateTime64(6, 'UTC')}"
        );
    }

    #[test]
    fn test_array_contains() {
        let dialect = ClickhouseDialect;
        assert_eq!(
            dialect.array_contains("t.tags", "{p1:String}"),
            "has(t.tags, {p1:String})"
        );
    }

    #[test]
    fn test_quote_identifier() {
        let dialect = ClickhouseDialect;
        assert_eq!(
            dialect.quote_identifier("sum_totalTokens"),
            "`sum_totalTokens`"
        );
        assert_eq!(dialect.quote_identifier("a`b"), "`a\\`b`");
    }

    #[test]
    fn test_join_uses_filtered_subquery() {
        let dialect = ClickhouseDialect;
        assert_eq!(
            dialect.join("scores", "s", "t.id = s.trace_id", "project_id", "{p1:String}"),
            "LEFT JOIN (SELECT * FROM scores WHERE project_id = {p1:String}) AS s ON t.id = s.trace_id"
        );
    }

    #[test]
    fn test_truncate_time() {
        let dialect = ClickhouseDialect;
        assert_eq!(
            dialect.truncate_time("t.timestamp", TimeBucket::Hour),
            "toStartOfHour(t.timestamp)"
        );
        assert_eq!(
            dialect.truncate_time("t.timestamp", TimeBucket::Month),
            "toDateTime(toStartOfMonth(t.timestamp), 'UTC')"
        );
    }

    #[test]
    fn test_bucket_relation() {
        let dialect = ClickhouseDialect;
        let values = vec!["{p1:DateTime64(6, 'UTC')}".to_string()];
        assert_eq!(
            dialect.bucket_relation(&values, "b", "bucket"),
            "(SELECT arrayJoin([{p1:DateTime64(6, 'UTC')}]) AS bucket) AS b"
        );
    }

    #[test]
    fn test_duration_ms() {
        let dialect = ClickhouseDialect;
        assert_eq!(
            dialect.duration_ms("start_time", "end_time"),
            "dateDiff('millisecond', start_time, end_time)"
        );
    }
}
