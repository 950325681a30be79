//! User and address convenience endpoints
//!
//! Fixed statements over the `user` and `address` tables, plus the
//! `AddUser` / `AddUserWithAddress` stored procedures.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::http::envelope::Envelope;
use crate::http::error::ApiError;
use crate::http::extractors::{JsonBody, QueryParams, UserId};
use crate::http::server::AppState;

const SELECT_USERS: &str = "SELECT * FROM user";
const SELECT_USER_BY_ID: &str = "SELECT * FROM user WHERE userid = ?";
const SELECT_USER_WITH_ADDRESS: &str = "SELECT * FROM address, user \
     WHERE user.userid = ? AND user.userid = address.userid";
const SELECT_ADDRESSES: &str = "SELECT * FROM address";
const SEARCH_USERS_BY_FIRSTNAME: &str = "SELECT * FROM user WHERE firstname LIKE ?";

const DEFAULT_COUNTRY: &str = "USA";

/// Search query parameters
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
}

/// New user request
#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    pub firstname: Option<Value>,
    pub lastname: Option<Value>,
    pub email: Option<Value>,
}

/// New user with address request
#[derive(Debug, Deserialize)]
pub struct AddUserWithAddressRequest {
    pub firstname: Option<Value>,
    pub lastname: Option<Value>,
    pub email: Option<Value>,
    pub street: Option<Value>,
    pub city: Option<Value>,
    pub state: Option<Value>,
    pub zipcode: Option<Value>,
    pub country: Option<Value>,
}

/// Present and not null, false, 0 or an empty string
fn provided(field: &Option<Value>) -> Option<&Value> {
    field.as_ref().filter(|v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Collect every required field, or None if any is missing
fn require_all(fields: &[&Option<Value>]) -> Option<Vec<Value>> {
    fields.iter().map(|f| provided(f).cloned()).collect()
}

/// GET /api/users - all users
async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Envelope>, ApiError> {
    let result = state.gateway.execute_query(SELECT_USERS, &[]).await?;
    Ok(Json(Envelope::rows(result)))
}

/// GET /api/users/{id} - one user
async fn get_user(
    State(state): State<Arc<AppState>>,
    UserId(id): UserId,
) -> Result<Json<Envelope>, ApiError> {
    let result = state
        .gateway
        .execute_query(SELECT_USER_BY_ID, &[Value::from(id)])
        .await?;

    let row = result
        .rows
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(Envelope::single(row)))
}

/// GET /api/users/{id}/address - user joined with their address
async fn get_user_address(
    State(state): State<Arc<AppState>>,
    UserId(id): UserId,
) -> Result<Json<Envelope>, ApiError> {
    let result = state
        .gateway
        .execute_query(SELECT_USER_WITH_ADDRESS, &[Value::from(id)])
        .await?;

    let row = result
        .rows
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("User or address not found"))?;
    Ok(Json(Envelope::single(row)))
}

/// GET /api/addresses - all addresses
async fn list_addresses(State(state): State<Arc<AppState>>) -> Result<Json<Envelope>, ApiError> {
    let result = state.gateway.execute_query(SELECT_ADDRESSES, &[]).await?;
    Ok(Json(Envelope::rows(result)))
}

/// GET /api/users/search?name= - substring match on firstname
async fn search_users(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<SearchParams>,
) -> Result<Json<Envelope>, ApiError> {
    let name = params
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::validation("Name parameter is required"))?;

    // Bound, not interpolated; LIKE wildcards in `name` still apply
    let pattern = Value::String(format!("%{}%", name));
    let result = state
        .gateway
        .execute_query(SEARCH_USERS_BY_FIRSTNAME, &[pattern])
        .await?;
    Ok(Json(Envelope::rows(result)))
}

/// POST /api/users/add - AddUser(firstname, lastname, email)
async fn add_user(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<AddUserRequest>,
) -> Result<Json<Envelope>, ApiError> {
    let args = require_all(&[&req.firstname, &req.lastname, &req.email])
        .ok_or_else(|| ApiError::validation("firstname, lastname, and email are required"))?;

    let result = state
        .gateway
        .execute_stored_procedure("AddUser", &args)
        .await?;
    Ok(Json(
        Envelope::rows(result).with_message("User added successfully"),
    ))
}

/// POST /api/users/add-with-address - AddUserWithAddress(..., country)
async fn add_user_with_address(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<AddUserWithAddressRequest>,
) -> Result<Json<Envelope>, ApiError> {
    let mut args = require_all(&[
        &req.firstname,
        &req.lastname,
        &req.email,
        &req.street,
        &req.city,
        &req.state,
        &req.zipcode,
    ])
    .ok_or_else(|| {
        ApiError::validation(
            "firstname, lastname, email, street, city, state, and zipcode are required",
        )
    })?;

    let country = provided(&req.country)
        .cloned()
        .unwrap_or_else(|| Value::from(DEFAULT_COUNTRY));
    args.push(country);

    let result = state
        .gateway
        .execute_stored_procedure("AddUserWithAddress", &args)
        .await?;
    Ok(Json(
        Envelope::rows(result).with_message("User with address added successfully"),
    ))
}

/// User routes
///
/// `/api/users/search` and `/api/users/add*` are static segments and take
/// priority over `/api/users/{id}`.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/search", get(search_users))
        .route("/api/users/add", post(add_user))
        .route("/api/users/add-with-address", post(add_user_with_address))
        .route("/api/users/{id}", get(get_user))
        .route("/api/users/{id}/address", get(get_user_address))
        .route("/api/addresses", get(list_addresses))
}
