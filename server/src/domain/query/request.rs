//! Caller-supplied query description
//!
//! Loosely typed on purpose: aggregations, granularities and directions stay
//! strings here and are checked against fixed enums by the validator, so an
//! unknown token is reported in its own category instead of as a JSON error.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::error::QueryError;

/// Query description, JSON with camelCase keys
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Registered view name (`traces`, `observations`, ...)
    #[validate(length(min = 1, max = 64, message = "view must be 1-64 characters"))]
    pub view: String,

    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 dimensions allowed"))]
    pub dimensions: Vec<DimensionRef>,

    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 metrics allowed"))]
    pub metrics: Vec<MetricRef>,

    /// Filters in the `type`/`column`/`operator`/`value` grammar
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub filters: Vec<serde_json::Value>,

    #[serde(default)]
    pub time_dimension: Option<TimeDimensionRef>,

    /// Alternative to `dimensions`/`timeDimension`; an entry with a
    /// granularity becomes the time dimension
    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 groupBy entries allowed"))]
    pub group_by: Vec<GroupByRef>,

    /// Window start (RFC 3339, naive UTC date-time or `YYYY-MM-DD`)
    pub from_timestamp: String,

    /// Window end, inclusive
    pub to_timestamp: String,

    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 orderBy entries allowed"))]
    pub order_by: Vec<OrderByRef>,

    /// 0-based page, default 0
    #[serde(default)]
    pub page: Option<i64>,

    /// Rows per page, default 100
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DimensionRef {
    pub field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MetricRef {
    #[serde(alias = "measure")]
    pub field: String,
    /// count, sum, avg, min, max, p50, p75, p90, p95, p99
    pub aggregation: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TimeDimensionRef {
    /// minute, hour, day, week, month or auto
    pub granularity: String,
    /// Datetime field to bucket, defaults to the view's time field
    #[serde(default)]
    pub field: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupByRef {
    pub field: String,
    #[serde(default)]
    pub granularity: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderByRef {
    /// Dimension name, `time_dimension` or a metric alias (`sum_totalTokens`)
    pub field: String,
    #[serde(default = "default_direction")]
    pub direction: String,
}

fn default_direction() -> String {
    "asc".to_string()
}

impl QueryRequest {
    /// Decode an untyped JSON description
    pub fn from_value(value: serde_json::Value) -> Result<Self, QueryError> {
        serde_json::from_value(value).map_err(|e| QueryError::query(e.to_string()))
    }
}
