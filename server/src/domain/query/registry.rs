//! Schema registry
//!
//! Static description of every queryable view: the physical relations, the
//! tenant column of each, and the public fields with their column
//! expressions, value types and capabilities. Built once at startup and
//! shared read-only.
//!
//! Every identifier that reaches SQL text comes from the `&'static str`
//! data in this module.

use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::data::sql::SqlDialect;

use super::views::BUILTIN_VIEWS;

// ============================================================================
// Field types
// ============================================================================

/// Declared type of a field, which decides the filter grammar it accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    String,
    Number,
    Datetime,
    StringOptions,
    ArrayOptions,
    Boolean,
    /// JSON map, filtered by key
    StringObject,
}

/// What a field may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Dimension,
    Metric,
    Filter,
    OrderBy,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dimension => "dimension",
            Self::Metric => "metric",
            Self::Filter => "filter",
            Self::OrderBy => "orderBy",
        }
    }
}

/// Independent capability flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub dimension: bool,
    pub metric: bool,
    pub filter: bool,
    pub order_by: bool,
}

impl Capabilities {
    /// Groupable, filterable and sortable
    pub const DIMENSION: Self = Self {
        dimension: true,
        metric: false,
        filter: true,
        order_by: true,
    };
    /// Filter only (timestamps, tags, JSON maps)
    pub const FILTER: Self = Self {
        dimension: false,
        metric: false,
        filter: true,
        order_by: false,
    };
    /// Aggregatable numeric column, also filterable per row
    pub const MEASURE: Self = Self {
        dimension: false,
        metric: true,
        filter: true,
        order_by: false,
    };
    /// Row or distinct counts
    pub const COUNT: Self = Self {
        dimension: false,
        metric: true,
        filter: false,
        order_by: false,
    };

    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Dimension => self.dimension,
            Capability::Metric => self.metric,
            Capability::Filter => self.filter,
            Capability::OrderBy => self.order_by,
        }
    }
}

/// Aggregation applied to a metric field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    P50,
    P75,
    P90,
    P95,
    P99,
}

impl Aggregation {
    pub const ALL: &'static [Aggregation] = &[
        Self::Count,
        Self::Sum,
        Self::Avg,
        Self::Min,
        Self::Max,
        Self::P50,
        Self::P75,
        Self::P90,
        Self::P95,
        Self::P99,
    ];

    /// Parse a caller token, case-insensitive
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|agg| agg.as_str().eq_ignore_ascii_case(s))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
            Self::P50 => "p50",
            Self::P75 => "p75",
            Self::P90 => "p90",
            Self::P95 => "p95",
            Self::P99 => "p99",
        }
    }

    /// Percentile as a fraction, for percentile aggregations
    pub fn quantile(&self) -> Option<f64> {
        match self {
            Self::P50 => Some(0.5),
            Self::P75 => Some(0.75),
            Self::P90 => Some(0.9),
            Self::P95 => Some(0.95),
            Self::P99 => Some(0.99),
            _ => None,
        }
    }
}

/// Only `count` is meaningful on count fields
pub const COUNT_ONLY: &[Aggregation] = &[Aggregation::Count];

// ============================================================================
// Expressions and relations
// ============================================================================

/// Physical expression behind a public field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnExpr {
    /// `alias.column`
    Column {
        table: &'static str,
        column: &'static str,
    },
    /// Milliseconds between two timestamp columns of the same table
    DurationMs {
        table: &'static str,
        start: &'static str,
        end: &'static str,
    },
    /// `count(*)`
    RowCount,
    /// `count(DISTINCT alias.column)`
    DistinctCount {
        table: &'static str,
        column: &'static str,
    },
}

impl ColumnExpr {
    /// Render the row-level expression
    pub fn render(&self, dialect: &dyn SqlDialect) -> String {
        match self {
            Self::Column { table, column } | Self::DistinctCount { table, column } => {
                format!("{}.{}", table, column)
            }
            Self::DurationMs { table, start, end } => dialect.duration_ms(
                &format!("{}.{}", table, start),
                &format!("{}.{}", table, end),
            ),
            Self::RowCount => "*".to_string(),
        }
    }
}

/// Public field of a view
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub expr: ColumnExpr,
    pub value_type: ValueType,
    pub capabilities: Capabilities,
    /// Allowed aggregations, `None` = all
    pub aggregations: Option<&'static [Aggregation]>,
}

impl FieldDescriptor {
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.has(capability)
    }

    pub fn allows(&self, aggregation: Aggregation) -> bool {
        match self.aggregations {
            Some(allowed) => allowed.contains(&aggregation),
            None => true,
        }
    }

    /// Aggregations usable on this field (empty unless it is a metric)
    pub fn allowed_aggregations(&self) -> &'static [Aggregation] {
        if !self.capabilities.metric {
            return &[];
        }
        self.aggregations.unwrap_or(Aggregation::ALL)
    }
}

/// Physical table with its alias and tenant column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef {
    pub table: &'static str,
    pub alias: &'static str,
    pub tenant_column: &'static str,
}

impl TableRef {
    /// `alias.tenant_column`
    pub fn tenant_expr(&self) -> String {
        format!("{}.{}", self.alias, self.tenant_column)
    }
}

/// LEFT JOIN of another relation onto the base relation
#[derive(Debug, Clone, Copy)]
pub struct JoinSpec {
    pub relation: TableRef,
    /// `(base column, joined column)` equality pairs
    pub on: &'static [(&'static str, &'static str)],
}

impl JoinSpec {
    /// Render the join condition against the base alias
    pub fn condition(&self, base: &TableRef) -> String {
        self.on
            .iter()
            .map(|(left, right)| {
                format!(
                    "{}.{} = {}.{}",
                    base.alias, left, self.relation.alias, right
                )
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

/// A named, queryable projection over one or more tables
#[derive(Debug)]
pub struct ViewDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub base: TableRef,
    pub joins: &'static [JoinSpec],
    /// Datetime field used for the window and for time bucketing
    pub time_field: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl ViewDescriptor {
    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field by public name, only if it carries `capability`
    pub fn resolve_field(
        &self,
        name: &str,
        capability: Capability,
    ) -> Option<&'static FieldDescriptor> {
        self.field(name).filter(|f| f.has(capability))
    }

    /// The view's time field
    ///
    /// Registry construction checks that it exists, so this only returns
    /// `None` for a hand-built descriptor.
    pub fn time_field_descriptor(&self) -> Option<&'static FieldDescriptor> {
        self.field(self.time_field)
    }

    /// Number of relations touched (base plus joins)
    pub fn relation_count(&self) -> usize {
        1 + self.joins.len()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Immutable lookup of views by name
#[derive(Debug)]
pub struct SchemaRegistry {
    views: Vec<&'static ViewDescriptor>,
    by_name: HashMap<&'static str, &'static ViewDescriptor>,
}

impl SchemaRegistry {
    /// Registry with the built-in trace, observation and score views
    pub fn builtin() -> Self {
        Self::new(BUILTIN_VIEWS)
    }

    /// Build a registry from static view descriptors
    ///
    /// Descriptors are compile-time data, so inconsistencies (duplicate
    /// names, a time field that is missing or not a datetime) are programming
    /// errors and are logged and skipped rather than returned.
    pub fn new(views: &'static [ViewDescriptor]) -> Self {
        let mut by_name = HashMap::with_capacity(views.len());
        let mut ordered = Vec::with_capacity(views.len());
        for view in views {
            let time_ok = view
                .time_field_descriptor()
                .is_some_and(|f| f.value_type == ValueType::Datetime);
            if !time_ok {
                tracing::error!(view = view.name, "View time field is not a datetime field");
                continue;
            }
            if by_name.insert(view.name, view).is_some() {
                tracing::error!(view = view.name, "Duplicate view name in registry");
                continue;
            }
            ordered.push(view);
        }
        Self {
            views: ordered,
            by_name,
        }
    }

    pub fn resolve_view(&self, name: &str) -> Option<&'static ViewDescriptor> {
        self.by_name.get(name).copied()
    }

    /// Look up a field that carries the required capability
    pub fn resolve_field(
        &self,
        view: &str,
        name: &str,
        capability: Capability,
    ) -> Option<&'static FieldDescriptor> {
        self.resolve_view(view)?.resolve_field(name, capability)
    }

    /// Views in registration order
    pub fn views(&self) -> impl Iterator<Item = &'static ViewDescriptor> + '_ {
        self.views.iter().copied()
    }
}
