//! Compilation properties checked across all three dialects

use serde_json::{Value, json};
use tracelens_server::data::sql::{Backend, CompiledQuery, QueryValue};
use tracelens_server::domain::query::{
    QueryError, QueryLimits, QueryRequest, SchemaRegistry, compile_request,
};

const BACKENDS: [Backend; 3] = [Backend::Duckdb, Backend::Postgres, Backend::Clickhouse];

const HOSTILE: &[&str] = &[
    "x'; DROP TABLE traces; --",
    "\" OR 1=1 --",
    "') UNION SELECT * FROM scores --",
    "50%_off\\",
    "$1 {p1:String} ?",
];

fn compile(backend: Backend, tenant: &str, body: Value) -> Result<CompiledQuery, QueryError> {
    let req = QueryRequest::from_value(body)?;
    compile_request(
        &SchemaRegistry::builtin(),
        QueryLimits::default(),
        backend,
        tenant,
        &req,
    )
}

/// Placeholders in the SQL text, by dialect syntax
fn placeholder_count(backend: Backend, sql: &str) -> usize {
    match backend {
        Backend::Duckdb => sql.matches('?').count(),
        Backend::Postgres => sql.matches('$').count(),
        Backend::Clickhouse => sql.matches("{p").count(),
    }
}

fn string_params(compiled: &CompiledQuery) -> Vec<&str> {
    compiled
        .params
        .iter()
        .filter_map(|v| match v {
            QueryValue::String(s) => Some(s.as_str()),
            _ => None,
        })
        .collect()
}

fn hostile_query(value: &str) -> Value {
    json!({
        "view": "traces_observations",
        "dimensions": [{"field": "name"}],
        "metrics": [{"field": "totalTokens", "aggregation": "sum"}],
        "filters": [
            {"type": "string", "column": "userId", "operator": "contains", "value": value},
            {"type": "string", "column": "name", "operator": "=", "value": value},
            {"type": "stringOptions", "column": "environment", "operator": "none of", "value": [value, "prod"]},
            {"type": "arrayOptions", "column": "tags", "operator": "all of", "value": [value]},
            {"type": "stringObject", "column": "metadata", "key": value, "operator": "starts with", "value": value}
        ],
        "timeDimension": {"granularity": "hour"},
        "fromTimestamp": "2024-01-01T00:00:00Z",
        "toTimestamp": "2024-01-01T06:00:00Z"
    })
}

#[test]
fn hostile_values_only_reach_parameters() {
    for backend in BACKENDS {
        for value in HOSTILE {
            let compiled = compile(backend, "acme", hostile_query(value)).unwrap();
            assert!(
                !compiled.sql.contains(value),
                "{} leaked into {} SQL: {}",
                value,
                backend,
                compiled.sql
            );
            assert!(!compiled.sql.contains("DROP"));
            assert!(!compiled.sql.contains("UNION"));
            // `all of` binds each value as-is
            assert!(string_params(&compiled).contains(value));
        }
    }
}

#[test]
fn hostile_tenant_is_bound_not_inlined() {
    for backend in BACKENDS {
        let compiled = compile(
            backend,
            "x' OR '1'='1",
            json!({
                "view": "traces",
                "metrics": [{"field": "count", "aggregation": "count"}],
                "fromTimestamp": "2024-01-01",
                "toTimestamp": "2024-01-02"
            }),
        )
        .unwrap();
        assert!(!compiled.sql.contains("'1'='1"));
        assert_eq!(string_params(&compiled), vec!["x' OR '1'='1"]);
    }
}

#[test]
fn placeholders_match_bound_parameters() {
    for backend in BACKENDS {
        for value in ["plain", "with space"] {
            let compiled = compile(backend, "acme", hostile_query(value)).unwrap();
            assert_eq!(
                placeholder_count(backend, &compiled.sql),
                compiled.params.len(),
                "{} SQL: {}",
                backend,
                compiled.sql
            );
        }
    }
}

#[test]
fn every_relation_is_tenant_scoped() {
    let registry = SchemaRegistry::builtin();
    for view in registry.views() {
        for backend in BACKENDS {
            let compiled = compile(
                backend,
                "tenant-42",
                json!({
                    "view": view.name,
                    "metrics": [{"field": "count", "aggregation": "count"}],
                    "fromTimestamp": "2024-01-01",
                    "toTimestamp": "2024-01-02"
                }),
            )
            .unwrap();
            let tenants = string_params(&compiled)
                .into_iter()
                .filter(|p| *p == "tenant-42")
                .count();
            assert_eq!(tenants, view.relation_count(), "{} on {}", view.name, backend);
        }
    }
}

#[test]
fn rejections_use_stable_categories() {
    let base = json!({
        "view": "traces",
        "metrics": [{"field": "count", "aggregation": "count"}],
        "fromTimestamp": "2024-01-01",
        "toTimestamp": "2024-01-02"
    });
    let with = |key: &str, value: Value| {
        let mut body = base.clone();
        body[key] = value;
        body
    };

    let cases: Vec<(Value, &str)> = vec![
        (with("view", json!("traces; DROP TABLE traces")), "Invalid query"),
        (with("fromTimestamp", json!("not a date")), "Invalid query"),
        (with("toTimestamp", json!("2023-12-31")), "Invalid query"),
        (with("limit", json!(0)), "Invalid query"),
        (with("page", json!(-1)), "Invalid query"),
        (
            with("timeDimension", json!({"granularity": "fortnight"})),
            "Invalid query",
        ),
        (
            with("dimensions", json!([{"field": "t.user_id"}])),
            "Invalid dimension",
        ),
        (
            with("dimensions", json!([{"field": "tags"}])),
            "Invalid dimension",
        ),
        (
            with("metrics", json!([{"field": "count", "aggregation": "sum"}])),
            "Invalid metric",
        ),
        (
            with("metrics", json!([{"field": "name", "aggregation": "count"}])),
            "Invalid metric",
        ),
        (
            with(
                "metrics",
                json!([{"field": "count", "aggregation": "count) FROM scores --"}]),
            ),
            "Invalid metric",
        ),
        (
            with(
                "filters",
                json!([{"type": "string", "column": "secret", "operator": "=", "value": "x"}]),
            ),
            "Invalid filter",
        ),
        (
            with(
                "filters",
                json!([{"type": "string", "column": "name", "operator": "= '' OR 1=1 --", "value": "x"}]),
            ),
            "Invalid filter",
        ),
        (
            with("orderBy", json!([{"field": "name", "direction": "asc"}])),
            "Invalid orderBy field",
        ),
    ];

    for backend in BACKENDS {
        for (body, prefix) in &cases {
            let err = compile(backend, "acme", body.clone()).unwrap_err();
            assert!(
                err.to_string().starts_with(prefix),
                "expected {} for {}, got {}",
                prefix,
                body,
                err
            );
            assert!(err.is_validation());
        }
    }
}

#[test]
fn order_by_is_scoped_to_selected_outputs() {
    let query = |order_by: Value, with_time: bool| {
        let mut body = json!({
            "view": "observations",
            "dimensions": [{"field": "name"}],
            "metrics": [{"field": "totalCost", "aggregation": "p95"}],
            "fromTimestamp": "2024-01-01",
            "toTimestamp": "2024-01-03",
            "orderBy": order_by
        });
        if with_time {
            body["timeDimension"] = json!({"granularity": "day"});
        }
        compile(Backend::Duckdb, "acme", body)
    };

    assert!(query(json!([{"field": "name", "direction": "DESC"}]), false).is_ok());
    assert!(query(json!([{"field": "p95_totalCost", "direction": "asc"}]), false).is_ok());
    assert!(query(json!([{"field": "time_dimension", "direction": "asc"}]), true).is_ok());

    for rejected in [
        json!([{"field": "type", "direction": "asc"}]),
        json!([{"field": "totalCost", "direction": "asc"}]),
        json!([{"field": "time_dimension", "direction": "asc"}]),
        json!([{"field": "name; DROP TABLE traces", "direction": "asc"}]),
    ] {
        let err = query(rejected, false).unwrap_err();
        assert!(matches!(err, QueryError::InvalidOrderBy(_)), "{}", err);
    }
}

#[test]
fn compilation_is_deterministic() {
    for backend in BACKENDS {
        let first = compile(backend, "acme", hostile_query("v")).unwrap();
        for _ in 0..10 {
            let again = compile(backend, "acme", hostile_query("v")).unwrap();
            assert_eq!(again, first);
        }
    }
}
