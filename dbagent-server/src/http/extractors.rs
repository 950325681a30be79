//! Custom Axum extractors
//!
//! Rejections are `ApiError`s so malformed input gets the same JSON envelope
//! as every other failure.

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use super::error::ApiError;

/// JSON request body that tolerates a missing body.
///
/// An empty body, or one sent with a non-JSON content type, deserializes as
/// `{}` so handlers report the missing field rather than a framing error.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let declared_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.to_ascii_lowercase().contains("json"));

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::validation(format!("Invalid request body: {}", e.body_text())))?;

        let body: &[u8] = if declared_json == Some(false) || bytes.trim_ascii().is_empty() {
            b"{}"
        } else {
            &bytes
        };

        serde_json::from_slice(body)
            .map(Self)
            .map_err(|e| ApiError::validation(format!("Invalid JSON body: {}", e)))
    }
}

/// Query string parameters with an enveloped rejection
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(params)| Self(params))
            .map_err(|e| ApiError::validation(format!("Invalid query string: {}", e.body_text())))
    }
}

/// Integer user id from the `{id}` path segment
pub struct UserId(pub i64);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| invalid_user_id())?;

        id.trim().parse().map(Self).map_err(|_| invalid_user_id())
    }
}

fn invalid_user_id() -> ApiError {
    ApiError::validation("Invalid user ID")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Default)]
    struct Probe {
        query: Option<String>,
    }

    async fn extract(content_type: Option<&str>, body: &'static str) -> Result<Probe, ApiError> {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        let req = builder.body(Body::from(body)).unwrap();
        JsonBody::<Probe>::from_request(req, &()).await.map(|b| b.0)
    }

    #[tokio::test]
    async fn empty_body_is_empty_object() {
        let probe = extract(Some("application/json"), "").await.unwrap();
        assert!(probe.query.is_none());
    }

    #[tokio::test]
    async fn non_json_content_type_is_empty_object() {
        let probe = extract(Some("text/plain"), "query=SELECT 1").await.unwrap();
        assert!(probe.query.is_none());
    }

    #[tokio::test]
    async fn missing_content_type_still_parses() {
        let probe = extract(None, r#"{"query": "SELECT 1"}"#).await.unwrap();
        assert_eq!(probe.query.as_deref(), Some("SELECT 1"));
    }

    #[tokio::test]
    async fn repeated_query_key_is_400() {
        let req = Request::builder()
            .uri("/?query=a&query=b")
            .body(Body::empty())
            .unwrap();
        let (mut parts, _) = req.into_parts();

        let err = QueryParams::<Probe>::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let err = extract(Some("application/json"), "{not json").await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
