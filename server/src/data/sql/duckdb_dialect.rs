//! DuckDB SQL dialect implementation

use super::{ParamType, SqlDialect, TimeBucket};

/// DuckDB SQL dialect
pub struct DuckdbDialect;

impl SqlDialect for DuckdbDialect {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn typed_placeholder(&self, _index: usize, ty: ParamType) -> String {
        match ty {
            ParamType::DateTime => "CAST(? AS TIMESTAMP)".to_string(),
            _ => "?".to_string(),
        }
    }

    fn truncate_time(&self, expr: &str, bucket: TimeBucket) -> String {
        format!("date_trunc('{}', {})", bucket.as_str(), expr)
    }

    fn percentile(&self, expr: &str, q: f64) -> String {
        format!("quantile_cont({}, {})", expr, q)
    }

    fn json_extract_string(&self, col: &str, key: &str) -> String {
        format!("json_extract_string({}, {})", col, key)
    }

    /// Keys are addressed as JSON pointers so no key needs quoting
    fn json_key(&self, key: &str) -> String {
        format!("/{}", key.replace('~', "~0").replace('/', "~1"))
    }

    fn array_contains(&self, array_col: &str, value: &str) -> String {
        format!("array_contains({}, {})", array_col, value)
    }

    fn duration_ms(&self, start: &str, end: &str) -> String {
        format!("DATE_DIFF('millisecond', {}, {})", start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let dialect = DuckdbDialect;
        assert_eq!(dialect.placeholder(1), "?");
        assert_eq!(dialect.placeholder(5), "?");
        assert_eq!(
            dialect.typed_placeholder(2, ParamType::DateTime),
            "CAST(? AS TIMESTAMP)"
        );
        assert_eq!(dialect.typed_placeholder(2, ParamType::Int), "?");
    }

    #[test]
    fn test_array_contains() {
        let dialect = DuckdbDialect;
        assert_eq!(dialect.array_contains("t.tags", "?"), "array_contains(t.tags, ?)");
    }

    #[test]
    fn test_truncate_time() {
        let dialect = DuckdbDialect;
        assert_eq!(
            dialect.truncate_time("o.start_time", TimeBucket::Week),
            "date_trunc('week', o.start_time)"
        );
    }

    #[test]
    fn test_percentile() {
        let dialect = DuckdbDialect;
        assert_eq!(
            dialect.percentile("o.total_cost", 0.95),
            "quantile_cont(o.total_cost, 0.95)"
        );
    }

    #[test]
    fn test_json_key_escapes_pointer() {
        let dialect = DuckdbDialect;
        assert_eq!(dialect.json_key("user"), "/user");
        assert_eq!(dialect.json_key("a/b~c"), "/a~1b~0c");
    }

    #[test]
    fn test_like_escape() {
        let dialect = DuckdbDialect;
        assert_eq!(dialect.like("t.name", "?", false), "t.name LIKE ? ESCAPE '\\'");
        assert_eq!(
            dialect.like("t.name", "?", true),
            "t.name NOT LIKE ? ESCAPE '\\'"
        );
    }

    #[test]
    fn test_bucket_relation() {
        let dialect = DuckdbDialect;
        let values = vec!["CAST(? AS TIMESTAMP)".to_string(); 2];
        assert_eq!(
            dialect.bucket_relation(&values, "b", "bucket"),
            "(VALUES (CAST(? AS TIMESTAMP)), (CAST(? AS TIMESTAMP))) AS b(bucket)"
        );
    }

    #[test]
    fn test_duration_ms() {
        let dialect = DuckdbDialect;
        assert_eq!(
            dialect.duration_ms("o.start_time", "o.end_time"),
            "DATE_DIFF('millisecond', o.start_time, o.end_time)"
        );
    }

    #[test]
    fn test_order_by_with_nulls() {
        let dialect = DuckdbDialect;
        assert_eq!(
            dialect.order_by_with_nulls("\"count_count\"", true, true),
            "\"count_count\" DESC NULLS LAST"
        );
    }
}
