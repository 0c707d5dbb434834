//! Query validation
//!
//! Turns a loosely typed [`QueryRequest`] into a [`ValidatedQuery`] whose
//! fields all point into the schema registry. Clauses are checked in a fixed
//! order and the first failure wins:
//!
//! view → dimensions → metrics → filters → timeDimension → timestamps →
//! orderBy → pagination

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::core::constants::{
    QUERY_DEFAULT_LIMIT, QUERY_MAX_BUCKETS, QUERY_MAX_LIMIT, TIME_DIMENSION_ALIAS,
};
use crate::data::sql::TimeBucket;
use crate::utils::time::parse_timestamp;

use super::error::QueryError;
use super::filters::{ValidatedFilter, parse_filters};
use super::granularity::{Granularity, bucket_starts};
use super::registry::{
    Aggregation, Capability, FieldDescriptor, SchemaRegistry, ValueType, ViewDescriptor,
};
use super::request::QueryRequest;

/// Limits applied during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    /// Largest accepted `limit`
    pub max_limit: i64,
    /// Largest number of time buckets
    pub max_buckets: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_limit: QUERY_MAX_LIMIT,
            max_buckets: QUERY_MAX_BUCKETS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedMetric {
    pub field: &'static FieldDescriptor,
    pub aggregation: Aggregation,
    /// `{aggregation}_{field}`
    pub alias: String,
}

#[derive(Debug, Clone)]
pub struct ValidatedTimeDimension {
    pub field: &'static FieldDescriptor,
    pub bucket: TimeBucket,
    /// Every bucket start in the window, ascending
    pub buckets: Vec<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOrder {
    /// Output column (dimension name, metric alias or `time_dimension`)
    pub alias: String,
    pub descending: bool,
}

/// Strongly typed query, ready to compile
#[derive(Debug, Clone)]
pub struct ValidatedQuery {
    pub view: &'static ViewDescriptor,
    /// Field the window applies to
    pub window_field: &'static FieldDescriptor,
    pub dimensions: Vec<&'static FieldDescriptor>,
    pub metrics: Vec<ValidatedMetric>,
    pub filters: Vec<ValidatedFilter>,
    pub time_dimension: Option<ValidatedTimeDimension>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub order_by: Vec<ValidatedOrder>,
    pub limit: i64,
    pub offset: i64,
}

/// Requested time dimension before the window is known
struct PendingTimeDimension {
    field: &'static FieldDescriptor,
    granularity: Granularity,
}

/// Validates query descriptions against a registry
pub struct QueryValidator<'r> {
    registry: &'r SchemaRegistry,
    limits: QueryLimits,
}

impl<'r> QueryValidator<'r> {
    pub fn new(registry: &'r SchemaRegistry, limits: QueryLimits) -> Self {
        Self { registry, limits }
    }

    /// Validate an untyped JSON description
    pub fn validate_value(&self, value: serde_json::Value) -> Result<ValidatedQuery, QueryError> {
        let request = QueryRequest::from_value(value)?;
        self.validate(&request)
    }

    pub fn validate(&self, req: &QueryRequest) -> Result<ValidatedQuery, QueryError> {
        req.validate()
            .map_err(|e| QueryError::query(e.to_string()))?;

        let view = self
            .registry
            .resolve_view(&req.view)
            .ok_or_else(|| QueryError::query(format!("Unknown view '{}'", req.view)))?;

        let dimensions = Self::dimensions(view, req)?;
        let metrics = Self::metrics(view, req)?;
        let filters = parse_filters(&req.filters, view)?;
        let pending = Self::time_dimension(view, req)?;

        if dimensions.is_empty() && metrics.is_empty() && pending.is_none() {
            return Err(QueryError::query(
                "Select at least one dimension, metric or time dimension",
            ));
        }

        let (from, to) = Self::window(req)?;
        let window_field = view.time_field_descriptor().ok_or_else(|| {
            QueryError::query(format!("View '{}' has no time field", view.name))
        })?;

        let time_dimension = match pending {
            Some(p) => {
                let bucket = p.granularity.resolve(from, to);
                let buckets = bucket_starts(from, to, bucket, self.limits.max_buckets)
                    .ok_or_else(|| {
                        QueryError::query(format!(
                            "Time range produces more than {} {} buckets",
                            self.limits.max_buckets,
                            bucket.as_str()
                        ))
                    })?;
                Some(ValidatedTimeDimension {
                    field: p.field,
                    bucket,
                    buckets,
                })
            }
            None => None,
        };

        let order_by = Self::order_by(req, &dimensions, &metrics, time_dimension.is_some())?;
        let (limit, offset) = self.pagination(req)?;

        Ok(ValidatedQuery {
            view,
            window_field,
            dimensions,
            metrics,
            filters,
            time_dimension,
            from,
            to,
            order_by,
            limit,
            offset,
        })
    }

    /// Plain dimensions plus `groupBy` entries without a granularity
    fn dimensions(
        view: &ViewDescriptor,
        req: &QueryRequest,
    ) -> Result<Vec<&'static FieldDescriptor>, QueryError> {
        let names = req.dimensions.iter().map(|d| d.field.as_str()).chain(
            req.group_by
                .iter()
                .filter(|g| g.granularity.is_none())
                .map(|g| g.field.as_str()),
        );

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for name in names {
            let field = view
                .resolve_field(name, Capability::Dimension)
                .ok_or_else(|| {
                    QueryError::dimension(format!(
                        "'{}' is not a {} of view '{}'",
                        name,
                        Capability::Dimension.as_str(),
                        view.name
                    ))
                })?;
            if !seen.insert(field.name) {
                return Err(QueryError::dimension(format!(
                    "Duplicate dimension '{}'",
                    field.name
                )));
            }
            out.push(field);
        }
        Ok(out)
    }

    fn metrics(view: &ViewDescriptor, req: &QueryRequest) -> Result<Vec<ValidatedMetric>, QueryError> {
        let mut aliases = HashSet::new();
        let mut out = Vec::with_capacity(req.metrics.len());
        for metric in &req.metrics {
            let field = view
                .resolve_field(&metric.field, Capability::Metric)
                .ok_or_else(|| {
                    QueryError::metric(format!(
                        "'{}' is not a {} of view '{}'",
                        metric.field,
                        Capability::Metric.as_str(),
                        view.name
                    ))
                })?;
            let aggregation = Aggregation::parse(&metric.aggregation).ok_or_else(|| {
                QueryError::metric(format!("Unknown aggregation '{}'", metric.aggregation))
            })?;
            if !field.allows(aggregation) {
                return Err(QueryError::metric(format!(
                    "Aggregation '{}' is not allowed on '{}'",
                    aggregation.as_str(),
                    field.name
                )));
            }
            let alias = format!("{}_{}", aggregation.as_str(), field.name);
            if !aliases.insert(alias.clone()) {
                return Err(QueryError::metric(format!("Duplicate metric '{}'", alias)));
            }
            out.push(ValidatedMetric {
                field,
                aggregation,
                alias,
            });
        }
        Ok(out)
    }

    /// `timeDimension` or a `groupBy` entry with a granularity, not both
    fn time_dimension(
        view: &'static ViewDescriptor,
        req: &QueryRequest,
    ) -> Result<Option<PendingTimeDimension>, QueryError> {
        let mut requested: Vec<(Option<&str>, &str)> = req
            .group_by
            .iter()
            .filter_map(|g| g.granularity.as_deref().map(|gr| (Some(g.field.as_str()), gr)))
            .collect();
        if let Some(td) = &req.time_dimension {
            requested.push((td.field.as_deref(), td.granularity.as_str()));
        }

        let (field_name, granularity) = match requested.as_slice() {
            [] => return Ok(None),
            [one] => *one,
            _ => return Err(QueryError::query("Only one time dimension is allowed")),
        };

        let granularity = Granularity::parse(granularity)
            .ok_or_else(|| QueryError::query(format!("Invalid granularity '{}'", granularity)))?;

        let name = field_name.unwrap_or(view.time_field);
        let field = view
            .field(name)
            .filter(|f| f.value_type == ValueType::Datetime)
            .ok_or_else(|| {
                QueryError::dimension(format!(
                    "'{}' is not a datetime field of view '{}'",
                    name, view.name
                ))
            })?;

        Ok(Some(PendingTimeDimension { field, granularity }))
    }

    fn window(req: &QueryRequest) -> Result<(DateTime<Utc>, DateTime<Utc>), QueryError> {
        let from = parse_timestamp(&req.from_timestamp)
            .ok_or_else(|| QueryError::query("fromTimestamp is not a valid timestamp"))?;
        let to = parse_timestamp(&req.to_timestamp)
            .ok_or_else(|| QueryError::query("toTimestamp is not a valid timestamp"))?;
        if from > to {
            return Err(QueryError::query(
                "fromTimestamp must not be after toTimestamp",
            ));
        }
        Ok((from, to))
    }

    /// Ordering only over what was selected
    fn order_by(
        req: &QueryRequest,
        dimensions: &[&'static FieldDescriptor],
        metrics: &[ValidatedMetric],
        has_time_dimension: bool,
    ) -> Result<Vec<ValidatedOrder>, QueryError> {
        req.order_by
            .iter()
            .map(|order| {
                let descending = match order.direction.trim().to_ascii_lowercase().as_str() {
                    "asc" => false,
                    "desc" => true,
                    _ => {
                        return Err(QueryError::order_by(format!(
                            "Invalid direction '{}'",
                            order.direction
                        )));
                    }
                };

                let field = order.field.as_str();
                let selected = (has_time_dimension && field == TIME_DIMENSION_ALIAS)
                    || dimensions
                        .iter()
                        .any(|d| d.name == field && d.has(Capability::OrderBy))
                    || metrics.iter().any(|m| m.alias == field);
                if !selected {
                    return Err(QueryError::order_by(format!(
                        "'{}' is not a selected dimension or metric",
                        field
                    )));
                }

                Ok(ValidatedOrder {
                    alias: field.to_string(),
                    descending,
                })
            })
            .collect()
    }

    fn pagination(&self, req: &QueryRequest) -> Result<(i64, i64), QueryError> {
        let page = req.page.unwrap_or(0);
        if page < 0 {
            return Err(QueryError::query("page must be non-negative"));
        }
        let limit = req.limit.unwrap_or(QUERY_DEFAULT_LIMIT);
        if limit < 1 || limit > self.limits.max_limit {
            return Err(QueryError::query(format!(
                "limit must be between 1 and {}",
                self.limits.max_limit
            )));
        }
        let offset = page
            .checked_mul(limit)
            .ok_or_else(|| QueryError::query("page is too large"))?;
        Ok((limit, offset))
    }
}
