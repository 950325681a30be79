//! Axum server setup
//!
//! Server skeleton with:
//! - Permissive CORS by default, localhost-only when disabled
//! - Tracing middleware
//! - Panic safety net rendering a generic 500
//! - Uniform 404 for unknown routes and methods
//! - Pool close on SIGTERM/Ctrl+C

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::envelope::Envelope;
use super::error::handle_panic;
use super::routes;
use crate::config::GatewayConfig;
use crate::db::{create_pool, MySqlExecutor};
use crate::gateway::Gateway;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
}

/// Build the application router with all routes
pub fn build_router(gateway: Gateway, cors_permissive: bool) -> Router {
    let state = AppState { gateway };

    let cors = if cors_permissive {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin([
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ])
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .merge(routes::health::router())
        .merge(routes::query::router())
        .merge(routes::users::router())
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Unknown route or method
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(Envelope::failure("Endpoint not found")),
    )
}

/// Create the pool, then serve until a shutdown signal.
///
/// # Errors
///
/// Returns [`ServerError::Database`] if the pool cannot be created; the
/// caller is expected to exit nonzero.
pub async fn run_server(config: GatewayConfig) -> Result<(), ServerError> {
    let pool = create_pool(&config.database)
        .await
        .map_err(ServerError::Database)?;

    let gateway = Gateway::from_config(Arc::new(MySqlExecutor::new(pool)), &config);
    let listener = TcpListener::bind(config.bind_addr).await?;

    serve(listener, gateway, config.cors_permissive).await
}

/// Serve on `listener` until Ctrl+C or SIGTERM, then close the pool.
///
/// In-flight requests are not awaited.
pub async fn serve(
    listener: TcpListener,
    gateway: Gateway,
    cors_permissive: bool,
) -> Result<(), ServerError> {
    let addr: SocketAddr = listener.local_addr()?;
    if !cors_permissive {
        tracing::info!("CORS: localhost origins only");
    }

    let app = build_router(gateway.clone(), cors_permissive);

    tracing::info!("Database agent running on http://{}", addr);
    tracing::info!("Available endpoints:");
    for (method, path, description) in routes::ENDPOINTS {
        tracing::info!("  {:<4} {} - {}", method, path, description);
    }

    tokio::select! {
        result = axum::serve(listener, app).into_future() => result?,
        _ = shutdown_signal() => {}
    }

    tracing::info!("Shutting down gracefully...");
    gateway.close().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Database connection error: {0}")]
    Database(sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockExecutor;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(Gateway::new(Arc::new(MockExecutor::new())), true)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unknown_route_is_404_envelope() {
        let response = app()
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({"success": false, "error": "Endpoint not found"})
        );
    }

    #[tokio::test]
    async fn wrong_method_is_404_envelope() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/users")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Endpoint not found");
    }

    #[tokio::test]
    async fn status_endpoint_is_ok() {
        let response = app()
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn pool_failure_message_names_database() {
        let err = ServerError::Database(sqlx::Error::PoolTimedOut);
        assert!(err.to_string().starts_with("Database connection error"));
    }
}
