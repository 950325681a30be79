//! HTTP server layer
//!
//! Axum server with:
//! - CORS (permissive by default)
//! - Request tracing
//! - Graceful shutdown with pool close
//! - JSON envelope for every response, errors included

pub mod envelope;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod server;

pub use envelope::Envelope;
pub use error::ApiError;
pub use server::{build_router, run_server, serve, AppState, ServerError};
