//! dbagent-server: HTTP gateway in front of a MySQL database
//!
//! Forwards JSON requests to a shared connection pool: raw parameterized
//! SQL, stored procedure calls, and a handful of fixed user/address
//! queries. Every outcome comes back as a JSON envelope.

pub mod config;
pub mod db;
pub mod gateway;
pub mod http;

pub use config::{ConfigError, DatabaseConfig, GatewayConfig};
pub use gateway::Gateway;
pub use http::{build_router, run_server, serve, ServerError};
