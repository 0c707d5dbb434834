//! Query service
//!
//! Validates, compiles and executes analytical queries for one project.
//! Store errors are logged here and surface to callers only as
//! [`QueryError::ExecutionFailed`].

use std::sync::Arc;

use crate::data::sql::{Backend, CompiledQuery};
use crate::data::{QueryExecutor, QueryRow};

use super::compile::QueryCompiler;
use super::error::QueryError;
use super::registry::SchemaRegistry;
use super::request::QueryRequest;
use super::validate::{QueryLimits, QueryValidator};

/// Validate and compile without executing
pub fn compile_request(
    registry: &SchemaRegistry,
    limits: QueryLimits,
    backend: Backend,
    tenant: &str,
    req: &QueryRequest,
) -> Result<CompiledQuery, QueryError> {
    let query = QueryValidator::new(registry, limits).validate(req)?;
    Ok(QueryCompiler::for_backend(backend).compile(&query, tenant))
}

#[derive(Clone)]
pub struct QueryService {
    registry: Arc<SchemaRegistry>,
    executor: Arc<dyn QueryExecutor>,
    limits: QueryLimits,
}

impl QueryService {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        executor: Arc<dyn QueryExecutor>,
        limits: QueryLimits,
    ) -> Self {
        Self {
            registry,
            executor,
            limits,
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn backend(&self) -> Backend {
        self.executor.backend()
    }

    /// Whether the store answers a trivial query
    pub async fn store_healthy(&self) -> bool {
        match self.executor.health_check().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(backend = e.backend(), error = %e, "Store health check failed");
                false
            }
        }
    }

    /// Run a query scoped to `project_id`
    pub async fn execute(
        &self,
        project_id: &str,
        req: &QueryRequest,
    ) -> Result<Vec<QueryRow>, QueryError> {
        let backend = self.backend();
        let compiled = compile_request(&self.registry, self.limits, backend, project_id, req)
            .inspect_err(|e| {
                tracing::debug!(project_id, view = %req.view, error = %e, "Query rejected");
            })?;

        tracing::trace!(
            project_id,
            backend = %backend,
            sql = %compiled.sql,
            params = compiled.params.len(),
            "Executing query"
        );

        self.executor.execute(&compiled).await.map_err(|e| {
            tracing::error!(
                project_id,
                backend = e.backend(),
                error = %e,
                "Query execution failed"
            );
            QueryError::ExecutionFailed
        })
    }
}
