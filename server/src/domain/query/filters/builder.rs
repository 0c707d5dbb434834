//! SQL filter builder
//!
//! Renders validated filters as WHERE fragments. Every value goes through
//! the binder; only registry expressions and dialect syntax reach the text.

use crate::data::sql::{ParamBinder, QueryValue};

use super::types::{ArrayMatch, FilterCondition, ValidatedFilter};

/// Render one filter against its field expression
pub fn build_filter(filter: &ValidatedFilter, binder: &mut ParamBinder<'_>) -> String {
    let expr = filter.field.expr.render(binder.dialect());
    build_condition(&expr, &filter.condition, binder)
}

/// Empty option lists follow set semantics: `any of []` matches no row,
/// while `none of []` and `all of []` match every row.
fn build_condition(expr: &str, condition: &FilterCondition, binder: &mut ParamBinder<'_>) -> String {
    let dialect = binder.dialect();
    match condition {
        FilterCondition::Compare { op, value } => {
            let ph = binder.bind(value.clone());
            format!("{} {} {}", expr, op.as_sql(), ph)
        }
        FilterCondition::Like { pattern, negated } => {
            let ph = binder.bind(QueryValue::String(pattern.clone()));
            dialect.like(expr, &ph, *negated)
        }
        FilterCondition::InList { values, negated } => {
            if values.is_empty() {
                return empty_list(!*negated);
            }
            let placeholders: Vec<String> = values
                .iter()
                .map(|v| binder.bind(QueryValue::String(v.clone())))
                .collect();
            let op = if *negated { "NOT IN" } else { "IN" };
            format!("{} {} ({})", expr, op, placeholders.join(", "))
        }
        FilterCondition::ArrayContains { values, mode } => {
            if values.is_empty() {
                return empty_list(*mode == ArrayMatch::Any);
            }
            let conditions: Vec<String> = values
                .iter()
                .map(|v| {
                    let ph = binder.bind(QueryValue::String(v.clone()));
                    dialect.array_contains(expr, &ph)
                })
                .collect();
            match mode {
                ArrayMatch::Any => format!("({})", conditions.join(" OR ")),
                ArrayMatch::All => format!("({})", conditions.join(" AND ")),
                ArrayMatch::None => format!("NOT ({})", conditions.join(" OR ")),
            }
        }
        FilterCondition::JsonKey { key, condition } => {
            let key_ph = binder.bind(QueryValue::String(dialect.json_key(key)));
            let lookup = dialect.json_extract_string(expr, &key_ph);
            build_condition(&lookup, condition, binder)
        }
        FilterCondition::Null { negated } => {
            if *negated {
                format!("{} IS NOT NULL", expr)
            } else {
                format!("{} IS NULL", expr)
            }
        }
    }
}

fn empty_list(matches_nothing: bool) -> String {
    if matches_nothing { "1=0" } else { "1=1" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sql::{Backend, QueryParams};
    use crate::domain::query::filters::parse_filters;
    use crate::domain::query::registry::SchemaRegistry;
    use serde_json::json;

    fn render(backend: Backend, view: &str, filter: serde_json::Value) -> (String, QueryParams) {
        let view = SchemaRegistry::builtin().resolve_view(view).unwrap();
        let filters = parse_filters(&[filter], view).unwrap();
        let mut binder = ParamBinder::new(backend.dialect());
        let sql = build_filter(&filters[0], &mut binder);
        (sql, binder.finish())
    }

    #[test]
    fn string_equality_is_bound() {
        let (sql, params) = render(
            Backend::Duckdb,
            "traces",
            json!({"type": "string", "column": "userId", "operator": "=", "value": "u1"}),
        );
        assert_eq!(sql, "t.user_id = ?");
        assert_eq!(params.iter().collect::<Vec<_>>(), vec![&QueryValue::String("u1".into())]);
    }

    #[test]
    fn string_contains_uses_escaped_like() {
        let (sql, params) = render(
            Backend::Duckdb,
            "traces",
            json!({"type": "string", "column": "name", "operator": "does not contain", "value": "a%"}),
        );
        assert_eq!(sql, r"t.name NOT LIKE ? ESCAPE '\'");
        assert_eq!(
            params.iter().collect::<Vec<_>>(),
            vec![&QueryValue::String("%a\\%%".into())]
        );
    }

    #[test]
    fn options_bind_each_element() {
        let (sql, params) = render(
            Backend::Postgres,
            "observations",
            json!({"type": "stringOptions", "column": "providedModelName", "operator": "any of", "value": ["gpt-4", "claude"]}),
        );
        assert_eq!(
            sql,
            "o.provided_model_name IN (CAST($1 AS TEXT), CAST($2 AS TEXT))"
        );
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn empty_options_follow_set_semantics() {
        let cases = [
            ("stringOptions", "environment", "any of", "1=0"),
            ("stringOptions", "environment", "none of", "1=1"),
            ("arrayOptions", "tags", "any of", "1=0"),
            ("arrayOptions", "tags", "none of", "1=1"),
            ("arrayOptions", "tags", "all of", "1=1"),
        ];
        for (kind, column, operator, expected) in cases {
            let (sql, params) = render(
                Backend::Duckdb,
                "traces",
                json!({"type": kind, "column": column, "operator": operator, "value": []}),
            );
            assert_eq!(sql, expected, "{} {}", kind, operator);
            assert!(params.is_empty());
        }
    }

    #[test]
    fn array_options_per_element() {
        let (sql, _) = render(
            Backend::Duckdb,
            "traces",
            json!({"type": "arrayOptions", "column": "tags", "operator": "none of", "value": ["a", "b"]}),
        );
        assert_eq!(
            sql,
            "NOT (array_contains(t.tags, ?) OR array_contains(t.tags, ?))"
        );

        let (sql, params) = render(
            Backend::Clickhouse,
            "traces",
            json!({"type": "arrayOptions", "column": "tags", "operator": "all of", "value": ["a", "b"]}),
        );
        assert_eq!(
            sql,
            "(has(t.tags, {p1:String}) AND has(t.tags, {p2:String}))"
        );
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn json_key_and_value_are_bound() {
        let (sql, params) = render(
            Backend::Duckdb,
            "traces",
            json!({"type": "stringObject", "column": "metadata", "key": "region", "operator": "=", "value": "eu"}),
        );
        assert_eq!(sql, "json_extract_string(t.metadata, ?) = ?");
        assert_eq!(
            params.iter().collect::<Vec<_>>(),
            vec![
                &QueryValue::String("/region".into()),
                &QueryValue::String("eu".into())
            ]
        );

        let (sql, _) = render(
            Backend::Postgres,
            "traces",
            json!({"type": "stringObject", "column": "metadata", "key": "region", "operator": "starts with", "value": "eu"}),
        );
        assert_eq!(
            sql,
            r"(t.metadata ->> CAST($1 AS TEXT)) LIKE CAST($2 AS TEXT) ESCAPE '\'"
        );
    }

    #[test]
    fn boolean_and_number_are_bound() {
        let (sql, params) = render(
            Backend::Duckdb,
            "traces",
            json!({"type": "boolean", "column": "bookmarked", "operator": "<>", "value": true}),
        );
        assert_eq!(sql, "t.bookmarked <> ?");
        assert_eq!(params.iter().next(), Some(&QueryValue::Bool(true)));

        let (sql, _) = render(
            Backend::Duckdb,
            "observations",
            json!({"type": "number", "column": "latency", "operator": ">", "value": 1500}),
        );
        assert_eq!(
            sql,
            "DATE_DIFF('millisecond', o.start_time, o.end_time) > ?"
        );
    }

    #[test]
    fn datetime_is_typed_placeholder() {
        let (sql, _) = render(
            Backend::Duckdb,
            "observations",
            json!({"type": "datetime", "column": "endTime", "operator": "<", "value": "2024-01-01T00:00:00Z"}),
        );
        assert_eq!(sql, "o.end_time < CAST(? AS TIMESTAMP)");
    }

    #[test]
    fn null_check() {
        let (sql, params) = render(
            Backend::Duckdb,
            "scores",
            json!({"type": "null", "column": "observationId", "operator": "is null"}),
        );
        assert_eq!(sql, "s.observation_id IS NULL");
        assert!(params.is_empty());
    }
}
