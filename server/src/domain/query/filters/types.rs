//! Filter type definitions
//!
//! `Filter` is the wire grammar, tagged by `type`. `FilterCondition` is the
//! validated form: field resolved, values typed and LIKE patterns escaped.

use serde::Deserialize;

use crate::data::sql::QueryValue;
use crate::domain::query::registry::{FieldDescriptor, ValueType};

/// Filter as sent by callers
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Filter {
    Datetime {
        column: String,
        operator: DatetimeOp,
        value: String,
    },
    String {
        column: String,
        operator: StringOp,
        value: String,
    },
    Number {
        column: String,
        operator: NumberOp,
        value: f64,
    },
    StringOptions {
        column: String,
        operator: OptionsOp,
        value: Vec<String>,
    },
    ArrayOptions {
        column: String,
        operator: ArrayOptionsOp,
        value: Vec<String>,
    },
    Boolean {
        column: String,
        operator: BooleanOp,
        value: bool,
    },
    /// JSON map lookup (`metadata`)
    StringObject {
        column: String,
        key: String,
        operator: StringOp,
        value: String,
    },
    Null {
        column: String,
        operator: NullOp,
    },
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub enum DatetimeOp {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub enum StringOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "does not contain")]
    DoesNotContain,
    #[serde(rename = "starts with")]
    StartsWith,
    #[serde(rename = "ends with")]
    EndsWith,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub enum NumberOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub enum OptionsOp {
    #[serde(rename = "any of")]
    AnyOf,
    #[serde(rename = "none of")]
    NoneOf,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub enum ArrayOptionsOp {
    #[serde(rename = "any of")]
    AnyOf,
    #[serde(rename = "all of")]
    AllOf,
    #[serde(rename = "none of")]
    NoneOf,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub enum BooleanOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<>")]
    Ne,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub enum NullOp {
    #[serde(rename = "is null")]
    IsNull,
    #[serde(rename = "is not null")]
    IsNotNull,
}

impl Filter {
    /// Public field name the filter targets
    pub fn column(&self) -> &str {
        match self {
            Self::Datetime { column, .. }
            | Self::String { column, .. }
            | Self::Number { column, .. }
            | Self::StringOptions { column, .. }
            | Self::ArrayOptions { column, .. }
            | Self::Boolean { column, .. }
            | Self::StringObject { column, .. }
            | Self::Null { column, .. } => column,
        }
    }

    /// Wire name of the filter type
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Datetime { .. } => "datetime",
            Self::String { .. } => "string",
            Self::Number { .. } => "number",
            Self::StringOptions { .. } => "stringOptions",
            Self::ArrayOptions { .. } => "arrayOptions",
            Self::Boolean { .. } => "boolean",
            Self::StringObject { .. } => "stringObject",
            Self::Null { .. } => "null",
        }
    }

    /// Whether this filter type may target a field of the given type
    ///
    /// `string` and `stringOptions` are interchangeable on text fields;
    /// `null` applies to any field.
    pub fn accepts(&self, value_type: ValueType) -> bool {
        match self {
            Self::Datetime { .. } => value_type == ValueType::Datetime,
            Self::String { .. } | Self::StringOptions { .. } => {
                matches!(value_type, ValueType::String | ValueType::StringOptions)
            }
            Self::Number { .. } => value_type == ValueType::Number,
            Self::ArrayOptions { .. } => value_type == ValueType::ArrayOptions,
            Self::Boolean { .. } => value_type == ValueType::Boolean,
            Self::StringObject { .. } => value_type == ValueType::StringObject,
            Self::Null { .. } => true,
        }
    }
}

/// Binary comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
        }
    }
}

impl From<DatetimeOp> for CompareOp {
    fn from(op: DatetimeOp) -> Self {
        match op {
            DatetimeOp::Gt => Self::Gt,
            DatetimeOp::Lt => Self::Lt,
            DatetimeOp::Gte => Self::Gte,
            DatetimeOp::Lte => Self::Lte,
        }
    }
}

impl From<NumberOp> for CompareOp {
    fn from(op: NumberOp) -> Self {
        match op {
            NumberOp::Eq => Self::Eq,
            NumberOp::Gt => Self::Gt,
            NumberOp::Lt => Self::Lt,
            NumberOp::Gte => Self::Gte,
            NumberOp::Lte => Self::Lte,
        }
    }
}

impl From<BooleanOp> for CompareOp {
    fn from(op: BooleanOp) -> Self {
        match op {
            BooleanOp::Eq => Self::Eq,
            BooleanOp::Ne => Self::Ne,
        }
    }
}

/// How array elements combine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayMatch {
    Any,
    All,
    None,
}

/// Validated predicate, rendered by the compiler
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    Compare { op: CompareOp, value: QueryValue },
    /// `pattern` is already escaped and wrapped in `%`
    Like { pattern: String, negated: bool },
    InList { values: Vec<String>, negated: bool },
    ArrayContains { values: Vec<String>, mode: ArrayMatch },
    /// String predicate on one key of a JSON map
    JsonKey {
        key: String,
        condition: Box<FilterCondition>,
    },
    Null { negated: bool },
}

/// Filter bound to its field descriptor
#[derive(Debug, Clone)]
pub struct ValidatedFilter {
    pub field: &'static FieldDescriptor,
    pub condition: FilterCondition,
}
