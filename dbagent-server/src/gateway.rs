//! Query and stored-procedure execution helpers
//!
//! Every database failure stops here: callers get a `DbError` value carrying
//! the driver's message, and the failure is logged once. No retries.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::GatewayConfig;
use crate::db::{DbError, ResultSet, SqlExecutor};

/// Shared handle to the executor plus per-call policy
#[derive(Clone)]
pub struct Gateway {
    executor: Arc<dyn SqlExecutor>,
    query_timeout: Option<Duration>,
    /// Lowercased names; MySQL routine names are case-insensitive
    procedure_allowlist: Option<Arc<HashSet<String>>>,
}

impl Gateway {
    pub fn new(executor: Arc<dyn SqlExecutor>) -> Self {
        Self {
            executor,
            query_timeout: None,
            procedure_allowlist: None,
        }
    }

    /// Apply the timeout and allow-list settings from `config`
    pub fn from_config(executor: Arc<dyn SqlExecutor>, config: &GatewayConfig) -> Self {
        Self::new(executor)
            .with_query_timeout(config.query_timeout)
            .with_procedure_allowlist(config.procedure_allowlist.clone())
    }

    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_procedure_allowlist(mut self, names: Option<Vec<String>>) -> Self {
        self.procedure_allowlist = names.map(|names| {
            Arc::new(names.into_iter().map(|n| n.to_lowercase()).collect())
        });
        self
    }

    /// Execute `statement` with `params` bound positionally.
    ///
    /// Any statement type is accepted.
    pub async fn execute_query(&self, statement: &str, params: &[Value]) -> Result<ResultSet, DbError> {
        self.run(statement, params).await.inspect_err(|e| {
            tracing::warn!(error = %e, "Query error");
        })
    }

    /// Invoke stored procedure `name` with one placeholder per argument.
    ///
    /// The name goes into the statement text as given; only the arguments
    /// are bound.
    pub async fn execute_stored_procedure(
        &self,
        name: &str,
        params: &[Value],
    ) -> Result<ResultSet, DbError> {
        if let Some(allowed) = &self.procedure_allowlist {
            if !allowed.contains(&name.to_lowercase()) {
                tracing::warn!(procedure = %name, "Procedure not in allowlist");
                return Err(DbError::ProcedureNotAllowed(name.to_string()));
            }
        }

        let statement = build_call_statement(name, params.len());
        self.run(&statement, params).await.inspect_err(|e| {
            tracing::warn!(procedure = %name, error = %e, "Stored procedure error");
        })
    }

    /// Close the underlying pool
    pub async fn close(&self) {
        self.executor.close().await;
    }

    async fn run(&self, statement: &str, params: &[Value]) -> Result<ResultSet, DbError> {
        tracing::debug!(statement = %statement, params = params.len(), "Executing statement");

        let Some(timeout) = self.query_timeout else {
            return self.executor.execute(statement, params).await;
        };

        match tokio::time::timeout(timeout, self.executor.execute(statement, params)).await {
            Ok(result) => result,
            Err(_) => Err(DbError::Timeout {
                seconds: timeout.as_secs(),
            }),
        }
    }
}

/// `CALL name(?, ?, ...)` with `arg_count` placeholders
pub fn build_call_statement(name: &str, arg_count: usize) -> String {
    let placeholders = vec!["?"; arg_count].join(", ");
    format!("CALL {}({})", name, placeholders)
}
