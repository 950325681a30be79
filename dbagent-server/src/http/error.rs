//! API error types with IntoResponse
//!
//! Errors are converted to the `{success: false, error}` envelope. Only
//! 400, 404 and 500 are produced here.

use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::envelope::Envelope;
use crate::db::DbError;

/// Generic message for faults whose cause is logged, not returned
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Missing or invalid input (400)
    Validation(String),

    /// Row or route not found (404)
    NotFound(String),

    /// Database rejected the statement (500, message returned verbatim)
    Database(DbError),

    /// Unexpected fault (500, logged, generic message)
    Internal { message: String },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Validation(msg) | Self::NotFound(msg) => msg,
            // Already logged where the statement ran
            Self::Database(e) => e.to_string(),
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        };

        (status, Json(Envelope::failure(message))).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::ProcedureNotAllowed(_) => Self::Validation(e.to_string()),
            _ => Self::Database(e),
        }
    }
}

/// Render a handler panic as a 500 with the generic message
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::Internal {
        message: format!("handler panicked: {}", detail),
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{json, Value};

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_400() {
        let response = ApiError::validation("SQL query is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"success": false, "error": "SQL query is required"})
        );
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let response = ApiError::not_found("User not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn database_error_is_500_with_driver_text() {
        let err = ApiError::from(DbError::Driver("Unknown column 'x'".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Unknown column 'x'");
    }

    #[tokio::test]
    async fn disallowed_procedure_is_400() {
        let err = ApiError::from(DbError::ProcedureNotAllowed("DropAll".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn internal_error_hides_cause() {
        let response = ApiError::Internal {
            message: "secret detail".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], INTERNAL_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn panic_payload_is_not_leaked() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], INTERNAL_ERROR_MESSAGE);
    }
}
