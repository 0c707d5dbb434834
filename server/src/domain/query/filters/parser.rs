//! Filter parsing
//!
//! Decodes JSON filter definitions, resolves their fields against the view
//! and converts values into bound-ready conditions.

use crate::data::sql::QueryValue;
use crate::domain::query::error::QueryError;
use crate::domain::query::registry::{Capability, ViewDescriptor};
use crate::utils::sql::{LikeMatch, like_pattern};
use crate::utils::time::parse_timestamp;

use super::types::{
    ArrayMatch, ArrayOptionsOp, CompareOp, Filter, FilterCondition, NullOp, OptionsOp, StringOp,
    ValidatedFilter,
};

/// Maximum number of filters allowed
pub const MAX_FILTERS: usize = 50;

/// Maximum number of values in one options filter
pub const MAX_FILTER_VALUES: usize = 1000;

/// Parse and validate every filter of a request
pub fn parse_filters(
    raw: &[serde_json::Value],
    view: &ViewDescriptor,
) -> Result<Vec<ValidatedFilter>, QueryError> {
    if raw.len() > MAX_FILTERS {
        return Err(QueryError::filter(format!(
            "Maximum {} filters allowed",
            MAX_FILTERS
        )));
    }

    raw.iter()
        .map(|value| {
            let filter: Filter = serde_json::from_value(value.clone())
                .map_err(|e| QueryError::filter(e.to_string()))?;
            resolve_filter(filter, view)
        })
        .collect()
}

/// Resolve one decoded filter against a view
pub fn resolve_filter(filter: Filter, view: &ViewDescriptor) -> Result<ValidatedFilter, QueryError> {
    let field = view
        .resolve_field(filter.column(), Capability::Filter)
        .ok_or_else(|| {
            QueryError::filter(format!(
                "Cannot filter by column '{}' in view '{}'",
                filter.column(),
                view.name
            ))
        })?;

    if !filter.accepts(field.value_type) {
        return Err(QueryError::filter(format!(
            "Filter type '{}' does not match column '{}'",
            filter.type_name(),
            field.name
        )));
    }

    let condition = match filter {
        Filter::Datetime {
            operator, value, ..
        } => {
            let dt = parse_timestamp(&value).ok_or_else(|| {
                QueryError::filter(format!("Invalid datetime value for '{}'", field.name))
            })?;
            FilterCondition::Compare {
                op: operator.into(),
                value: QueryValue::DateTime(dt),
            }
        }
        Filter::String {
            operator, value, ..
        } => string_condition(operator, value),
        Filter::Number {
            operator, value, ..
        } => {
            if !value.is_finite() {
                return Err(QueryError::filter(format!(
                    "Invalid number value for '{}'",
                    field.name
                )));
            }
            FilterCondition::Compare {
                op: operator.into(),
                value: QueryValue::Float(value),
            }
        }
        Filter::StringOptions {
            operator, value, ..
        } => {
            check_value_count(&value, field.name)?;
            FilterCondition::InList {
                values: value,
                negated: matches!(operator, OptionsOp::NoneOf),
            }
        }
        Filter::ArrayOptions {
            operator, value, ..
        } => {
            check_value_count(&value, field.name)?;
            let mode = match operator {
                ArrayOptionsOp::AnyOf => ArrayMatch::Any,
                ArrayOptionsOp::AllOf => ArrayMatch::All,
                ArrayOptionsOp::NoneOf => ArrayMatch::None,
            };
            FilterCondition::ArrayContains {
                values: value,
                mode,
            }
        }
        Filter::Boolean {
            operator, value, ..
        } => FilterCondition::Compare {
            op: operator.into(),
            value: QueryValue::Bool(value),
        },
        Filter::StringObject {
            key,
            operator,
            value,
            ..
        } => {
            if key.trim().is_empty() {
                return Err(QueryError::filter(format!(
                    "Missing key for '{}'",
                    field.name
                )));
            }
            FilterCondition::JsonKey {
                key,
                condition: Box::new(string_condition(operator, value)),
            }
        }
        Filter::Null { operator, .. } => FilterCondition::Null {
            negated: matches!(operator, NullOp::IsNotNull),
        },
    };

    Ok(ValidatedFilter { field, condition })
}

fn string_condition(operator: StringOp, value: String) -> FilterCondition {
    let (kind, negated) = match operator {
        StringOp::Eq => {
            return FilterCondition::Compare {
                op: CompareOp::Eq,
                value: QueryValue::String(value),
            };
        }
        StringOp::Contains => (LikeMatch::Contains, false),
        StringOp::DoesNotContain => (LikeMatch::Contains, true),
        StringOp::StartsWith => (LikeMatch::StartsWith, false),
        StringOp::EndsWith => (LikeMatch::EndsWith, false),
    };
    FilterCondition::Like {
        pattern: like_pattern(&value, kind),
        negated,
    }
}

fn check_value_count(values: &[String], field: &str) -> Result<(), QueryError> {
    if values.len() > MAX_FILTER_VALUES {
        return Err(QueryError::filter(format!(
            "At most {} values allowed for '{}'",
            MAX_FILTER_VALUES, field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::registry::SchemaRegistry;
    use serde_json::json;

    fn traces() -> &'static ViewDescriptor {
        SchemaRegistry::builtin().resolve_view("traces").unwrap()
    }

    fn parse_one(value: serde_json::Value) -> Result<ValidatedFilter, QueryError> {
        parse_filters(&[value], traces()).map(|mut v| v.remove(0))
    }

    #[test]
    fn parse_filters_string_contains_escapes_pattern() {
        let filter = parse_one(json!({
            "type": "string", "column": "userId", "operator": "contains", "value": "50%_off"
        }))
        .unwrap();
        assert_eq!(filter.field.name, "userId");
        assert_eq!(
            filter.condition,
            FilterCondition::Like {
                pattern: "%50\\%\\_off%".into(),
                negated: false
            }
        );
    }

    #[test]
    fn parse_filters_string_options_on_text_field() {
        let filter = parse_one(json!({
            "type": "stringOptions", "column": "name", "operator": "none of", "value": ["a", "b"]
        }))
        .unwrap();
        assert_eq!(
            filter.condition,
            FilterCondition::InList {
                values: vec!["a".into(), "b".into()],
                negated: true
            }
        );
    }

    #[test]
    fn parse_filters_array_options_modes() {
        let filter = parse_one(json!({
            "type": "arrayOptions", "column": "tags", "operator": "all of", "value": ["x"]
        }))
        .unwrap();
        assert!(matches!(
            filter.condition,
            FilterCondition::ArrayContains {
                mode: ArrayMatch::All,
                ..
            }
        ));
    }

    #[test]
    fn parse_filters_datetime_value_parsed() {
        let filter = parse_one(json!({
            "type": "datetime", "column": "timestamp", "operator": ">=", "value": "2024-01-01"
        }))
        .unwrap();
        assert!(matches!(
            filter.condition,
            FilterCondition::Compare {
                op: CompareOp::Gte,
                value: QueryValue::DateTime(_)
            }
        ));

        let err = parse_one(json!({
            "type": "datetime", "column": "timestamp", "operator": ">=", "value": "yesterday"
        }))
        .unwrap_err();
        assert!(matches!(err, QueryError::InvalidFilter(_)));
    }

    #[test]
    fn parse_filters_string_object_requires_key() {
        let filter = parse_one(json!({
            "type": "stringObject", "column": "metadata", "key": "region",
            "operator": "=", "value": "eu"
        }))
        .unwrap();
        assert!(matches!(filter.condition, FilterCondition::JsonKey { .. }));

        let err = parse_one(json!({
            "type": "stringObject", "column": "metadata", "operator": "=", "value": "eu"
        }))
        .unwrap_err();
        assert!(matches!(err, QueryError::InvalidFilter(_)));

        let err = parse_one(json!({
            "type": "stringObject", "column": "metadata", "key": " ",
            "operator": "=", "value": "eu"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("Missing key"));
    }

    #[test]
    fn parse_filters_null_on_any_field() {
        let filter = parse_one(json!({
            "type": "null", "column": "sessionId", "operator": "is not null"
        }))
        .unwrap();
        assert_eq!(filter.condition, FilterCondition::Null { negated: true });
    }

    #[test]
    fn parse_filters_rejects_unknown_column() {
        let err = parse_one(json!({
            "type": "string", "column": "t.id; DROP TABLE traces", "operator": "=", "value": "x"
        }))
        .unwrap_err();
        assert!(matches!(err, QueryError::InvalidFilter(_)));
    }

    #[test]
    fn parse_filters_rejects_non_filter_field() {
        let err = parse_one(json!({
            "type": "number", "column": "count", "operator": ">", "value": 1
        }))
        .unwrap_err();
        assert!(matches!(err, QueryError::InvalidFilter(_)));
    }

    #[test]
    fn parse_filters_rejects_type_mismatch() {
        let err = parse_one(json!({
            "type": "number", "column": "name", "operator": ">", "value": 1
        }))
        .unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn parse_filters_rejects_unknown_operator() {
        let err = parse_one(json!({
            "type": "string", "column": "name", "operator": "LIKE '%' OR 1=1", "value": "x"
        }))
        .unwrap_err();
        assert!(matches!(err, QueryError::InvalidFilter(_)));
    }

    #[test]
    fn parse_filters_rejects_too_many() {
        let raw: Vec<serde_json::Value> = (0..=MAX_FILTERS)
            .map(|_| json!({"type": "null", "column": "name", "operator": "is null"}))
            .collect();
        let err = parse_filters(&raw, traces()).unwrap_err();
        assert!(err.to_string().contains("Maximum 50 filters"));
    }
}
