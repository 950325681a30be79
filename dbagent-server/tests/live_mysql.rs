//! End-to-end tests against a real MySQL database
//!
//! Expects the `users_test` schema (tables `user`, `address` and the
//! `AddUser` / `GetAllUsers` procedures). Run with:
//! DB_NAME=users_test cargo test -p dbagent-server --test live_mysql -- --ignored

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use dbagent_server::db::{create_pool, MySqlExecutor};
use dbagent_server::{build_router, Gateway, GatewayConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn live_app() -> (Router, Gateway) {
    let config = GatewayConfig::from_env().expect("valid test environment");
    let pool = create_pool(&config.database)
        .await
        .expect("pool creation failed");
    let gateway = Gateway::from_config(Arc::new(MySqlExecutor::new(pool)), &config);
    (build_router(gateway.clone(), true), gateway)
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
#[ignore = "requires database"]
async fn parameterized_select_round_trips() {
    let (app, gateway) = live_app().await;

    let (status, body) = post_json(
        app,
        "/api/query",
        json!({"query": "SELECT ? as param", "params": ["test_value"]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([{"param": "test_value"}]));
    assert_eq!(body["count"], 1);
    gateway.close().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn syntax_error_is_500_with_server_message() {
    let (app, gateway) = live_app().await;

    let (status, body) = post_json(app, "/api/query", json!({"query": "INVALID SQL QUERY"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("SQL syntax"));
    gateway.close().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn add_user_returns_new_id() {
    let (app, gateway) = live_app().await;

    let (status, body) = post_json(
        app,
        "/api/users/add",
        json!({"firstname": "Live", "lastname": "Test", "email": "live@example.com"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"][0]["new_user_id"].as_u64().unwrap_or(0) > 0);
    gateway.close().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn get_all_users_procedure_returns_array() {
    let (app, gateway) = live_app().await;

    let (status, body) = post_json(
        app,
        "/api/procedure",
        json!({"procedure": "GetAllUsers", "params": []}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_array());
    assert_eq!(body["procedure"], "GetAllUsers");
    gateway.close().await;
}
