//! Typed query parameters and the compiled query handed to executors

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use super::SqlDialect;

/// Parameter type, used by dialects that need typed placeholders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Int,
    Float,
    Bool,
    DateTime,
}

/// A single bound value
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(DateTime<Utc>),
}

impl QueryValue {
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::String(_) => ParamType::String,
            Self::Int(_) => ParamType::Int,
            Self::Float(_) => ParamType::Float,
            Self::Bool(_) => ParamType::Bool,
            Self::DateTime(_) => ParamType::DateTime,
        }
    }
}

impl Serialize for QueryValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::DateTime(dt) => {
                serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Micros, true))
            }
        }
    }
}

/// Ordered parameter list (maintains insertion order)
///
/// Parameter `i` (1-based) is exposed under the name `p{i}` for stores that
/// bind by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QueryParams {
    values: Vec<QueryValue>,
}

impl QueryParams {
    /// Append a value and return its 1-based index
    pub fn push(&mut self, value: QueryValue) -> usize {
        self.values.push(value);
        self.values.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueryValue> {
        self.values.iter()
    }

    /// Values paired with their placeholder names (`p1`, `p2`, ...)
    pub fn named(&self) -> impl Iterator<Item = (String, &QueryValue)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("p{}", i + 1), v))
    }
}

/// Binds values while SQL text is generated left to right
///
/// Each call to [`bind`](Self::bind) appends the value and returns the
/// placeholder to splice into the text, so positional placeholders stay
/// aligned with the parameter list.
pub struct ParamBinder<'d> {
    dialect: &'d dyn SqlDialect,
    params: QueryParams,
}

impl<'d> ParamBinder<'d> {
    pub fn new(dialect: &'d dyn SqlDialect) -> Self {
        Self {
            dialect,
            params: QueryParams::default(),
        }
    }

    pub fn dialect(&self) -> &'d dyn SqlDialect {
        self.dialect
    }

    pub fn bind(&mut self, value: QueryValue) -> String {
        let ty = value.param_type();
        let index = self.params.push(value);
        self.dialect.typed_placeholder(index, ty)
    }

    pub fn finish(self) -> QueryParams {
        self.params
    }
}

/// Role of a result column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Time,
    Dimension,
    Metric,
}

/// Result column, in SELECT order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputColumn {
    pub name: String,
    pub kind: ColumnKind,
}

/// SQL text plus its ordered parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: QueryParams,
    pub columns: Vec<OutputColumn>,
}

impl CompiledQuery {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}
