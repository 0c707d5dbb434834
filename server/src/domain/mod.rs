//! Domain logic
//!
//! - `query` - Generic analytical query builder over traces, observations and scores

pub mod query;

pub use query::{QueryError, QueryRequest, QueryService, SchemaRegistry};
