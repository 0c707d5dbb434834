//! Analytical query builder
//!
//! - `registry` / `views` - Queryable views and their fields
//! - `request` - Caller-supplied query description
//! - `filters` - Filter grammar, validation and SQL rendering
//! - `granularity` - Time buckets
//! - `validate` - Request to strongly typed query
//! - `compile` - Typed query to parameterized SQL
//! - `service` - Validate, compile and execute for a project

mod compile;
mod error;
pub mod filters;
mod granularity;
mod registry;
mod request;
mod service;
mod validate;
mod views;

pub use compile::QueryCompiler;
pub use error::QueryError;
pub use granularity::{Granularity, auto_bucket, bucket_starts, truncate};
pub use registry::{
    Aggregation, Capabilities, Capability, ColumnExpr, FieldDescriptor, JoinSpec, SchemaRegistry,
    TableRef, ValueType, ViewDescriptor,
};
pub use request::{
    DimensionRef, GroupByRef, MetricRef, OrderByRef, QueryRequest, TimeDimensionRef,
};
pub use service::{QueryService, compile_request};
pub use validate::{
    QueryLimits, QueryValidator, ValidatedMetric, ValidatedOrder, ValidatedQuery,
    ValidatedTimeDimension,
};
pub use views::BUILTIN_VIEWS;
