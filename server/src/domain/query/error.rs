//! Query error taxonomy
//!
//! Validation categories are stable: API clients and tests key off the
//! message prefix and the error code.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Malformed request, unknown view, bad window, granularity or pagination
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),

    #[error("Invalid metric: {0}")]
    InvalidMetric(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid orderBy field: {0}")]
    InvalidOrderBy(String),

    /// Store-level failure; details are logged, never returned
    #[error("Query execution failed")]
    ExecutionFailed,
}

impl QueryError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidQuery(_) => "INVALID_QUERY",
            Self::InvalidDimension(_) => "INVALID_DIMENSION",
            Self::InvalidMetric(_) => "INVALID_METRIC",
            Self::InvalidFilter(_) => "INVALID_FILTER",
            Self::InvalidOrderBy(_) => "INVALID_ORDER_BY",
            Self::ExecutionFailed => "QUERY_EXECUTION_FAILED",
        }
    }

    /// Caller-fixable rejection (everything except execution failures)
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::ExecutionFailed)
    }

    pub(crate) fn query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    pub(crate) fn dimension(msg: impl Into<String>) -> Self {
        Self::InvalidDimension(msg.into())
    }

    pub(crate) fn metric(msg: impl Into<String>) -> Self {
        Self::InvalidMetric(msg.into())
    }

    pub(crate) fn filter(msg: impl Into<String>) -> Self {
        Self::InvalidFilter(msg.into())
    }

    pub(crate) fn order_by(msg: impl Into<String>) -> Self {
        Self::InvalidOrderBy(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_prefixes() {
        assert_eq!(
            QueryError::query("unknown view").to_string(),
            "Invalid query: unknown view"
        );
        assert!(
            QueryError::order_by("x")
                .to_string()
                .starts_with("Invalid orderBy field")
        );
        assert_eq!(
            QueryError::ExecutionFailed.to_string(),
            "Query execution failed"
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(QueryError::dimension("x").code(), "INVALID_DIMENSION");
        assert_eq!(QueryError::metric("x").code(), "INVALID_METRIC");
        assert_eq!(QueryError::filter("x").code(), "INVALID_FILTER");
        assert_eq!(QueryError::order_by("x").code(), "INVALID_ORDER_BY");
        assert!(QueryError::query("x").is_validation());
        assert!(!QueryError::ExecutionFailed.is_validation());
    }
}
