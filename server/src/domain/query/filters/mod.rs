//! Query filter system
//!
//! One canonical grammar: `{type, column, operator, value[, key]}`.
//! Filters are decoded and type-checked against the view, then rendered
//! with every value bound.

mod builder;
mod parser;
mod types;

pub use builder::build_filter;
pub use parser::{MAX_FILTER_VALUES, MAX_FILTERS, parse_filters, resolve_filter};
pub use types::{
    ArrayMatch, ArrayOptionsOp, BooleanOp, CompareOp, DatetimeOp, Filter, FilterCondition,
    NullOp, NumberOp, OptionsOp, StringOp, ValidatedFilter,
};
