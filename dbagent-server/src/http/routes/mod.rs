//! Route handlers organized by resource

pub mod health;
pub mod query;
pub mod users;

/// Endpoints logged at startup
pub const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/health", "Health check"),
    ("GET", "/status", "Health check"),
    ("POST", "/api/query", "Execute custom SQL"),
    ("POST", "/api/procedure", "Execute stored procedure"),
    ("GET", "/api/users", "Get all users"),
    ("GET", "/api/users/:id", "Get user by ID"),
    ("GET", "/api/users/:id/address", "Get user with address"),
    ("GET", "/api/addresses", "Get all addresses"),
    ("GET", "/api/users/search?name=John", "Search users"),
    ("POST", "/api/users/add", "Add user (stored procedure)"),
    (
        "POST",
        "/api/users/add-with-address",
        "Add user with address (stored procedure)",
    ),
];
