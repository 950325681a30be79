//! Database layer - connection pool and statement execution
//!
//! Handlers never touch the pool directly. They go through a
//! [`SqlExecutor`], which the MySQL pool implements and tests replace
//! with [`MockExecutor`].

pub mod executor;
pub mod mock;
pub mod pool;

pub use executor::{DbError, MySqlExecutor, ResultSet, Row, SqlExecutor};
pub use mock::{row, MockExecutor, MockReply};
pub use pool::{connect_lazy, create_pool};
