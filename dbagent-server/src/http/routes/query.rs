//! Raw SQL and stored-procedure endpoints
//!
//! POST /api/query     - `{query | sql, params?}`
//! POST /api/procedure - `{procedure, params?}`
//!
//! No statement-type restriction is applied to /api/query.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::Value;

use crate::http::envelope::Envelope;
use crate::http::error::ApiError;
use crate::http::extractors::JsonBody;
use crate::http::server::AppState;

/// Raw SQL request. `query` and `sql` are synonyms; `query` wins.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: Option<String>,
    pub sql: Option<String>,
    pub params: Option<Vec<Value>>,
}

impl QueryRequest {
    fn statement(&self) -> Option<&str> {
        non_empty(&self.query).or_else(|| non_empty(&self.sql))
    }
}

/// Stored procedure request
#[derive(Debug, Deserialize)]
pub struct ProcedureRequest {
    pub procedure: Option<String>,
    pub params: Option<Vec<Value>>,
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// POST /api/query - execute a parameterized statement
async fn execute_query(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<QueryRequest>,
) -> Result<Json<Envelope>, ApiError> {
    let statement = req
        .statement()
        .ok_or_else(|| ApiError::validation("SQL query is required"))?;
    let params = req.params.as_deref().unwrap_or_default();

    let result = state.gateway.execute_query(statement, params).await?;
    Ok(Json(Envelope::rows(result)))
}

/// POST /api/procedure - call a stored procedure
async fn execute_procedure(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<ProcedureRequest>,
) -> Result<Json<Envelope>, ApiError> {
    let procedure = non_empty(&req.procedure)
        .ok_or_else(|| ApiError::validation("Procedure name is required"))?;
    let params = req.params.as_deref().unwrap_or_default();

    let result = state
        .gateway
        .execute_stored_procedure(procedure, params)
        .await?;
    Ok(Json(Envelope::rows(result).with_procedure(procedure)))
}

/// Query routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/query", post(execute_query))
        .route("/api/procedure", post(execute_procedure))
}
