//! Statement execution against MySQL
//!
//! Parameters arrive as JSON values and are bound positionally by the driver.
//! Result rows are decoded column by column into JSON objects, keyed by
//! column name, in the order the server returns them.

use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use serde_json::{Map, Number, Value};
use sqlx::mysql::{MySqlArguments, MySqlConnection, MySqlRow, MySqlValueRef};
use sqlx::query::Query;
use sqlx::{Column, Connection, Either, MySql, MySqlPool, Row as _, TypeInfo, ValueRef};
use tokio::sync::Semaphore;

/// A single result row as a JSON object
pub type Row = Map<String, Value>;

/// Outcome of one statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Rows from every result set the statement produced, in server order
    pub rows: Vec<Row>,
    /// Rows changed by INSERT/UPDATE/DELETE
    pub rows_affected: u64,
    /// AUTO_INCREMENT id generated by the statement, 0 if none
    pub last_insert_id: u64,
}

impl ResultSet {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }
}

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("{}", driver_message(.0))]
    Sqlx(#[from] sqlx::Error),

    /// Failure reported by a non-sqlx executor
    #[error("{0}")]
    Driver(String),

    #[error("query timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("procedure '{0}' is not allowed")]
    ProcedureNotAllowed(String),

    #[error("connection pool is closed")]
    PoolClosed,
}

/// The server's own message for database errors, sqlx's rendering otherwise.
fn driver_message(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db) => db.message().to_string(),
        other => other.to_string(),
    }
}

/// Trait for statement execution (testable)
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Run `statement` with `params` bound positionally.
    async fn execute(&self, statement: &str, params: &[Value]) -> Result<ResultSet, DbError>;

    /// Release pooled resources. Further calls to `execute` fail.
    async fn close(&self) {}
}

/// Real executor backed by a sqlx MySQL pool
///
/// Callers beyond the pool's connection limit queue on `slots` without a
/// deadline. The pool's own acquire timeout then only covers connecting.
#[derive(Clone)]
pub struct MySqlExecutor {
    pool: MySqlPool,
    slots: Arc<Semaphore>,
}

impl MySqlExecutor {
    pub fn new(pool: MySqlPool) -> Self {
        let limit = pool.options().get_max_connections() as usize;
        Self {
            pool,
            slots: Arc::new(Semaphore::new(limit)),
        }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn fetch_all_results(
        &self,
        statement: &str,
        params: &[Value],
    ) -> Result<ResultSet, sqlx::Error> {
        let query = params
            .iter()
            .fold(sqlx::query(statement), |query, value| bind_json(query, value));

        let mut result = ResultSet::default();

        // CALL produces one result set per SELECT in the procedure body plus a
        // trailing OK packet; fetch_many is the only API that surfaces both.
        #[allow(deprecated)]
        let mut stream = query.fetch_many(&self.pool);

        while let Some(item) = stream.try_next().await? {
            match item {
                Either::Left(done) => {
                    result.rows_affected += done.rows_affected();
                    if done.last_insert_id() != 0 {
                        result.last_insert_id = done.last_insert_id();
                    }
                }
                Either::Right(row) => result.rows.push(row_to_json(&row)?),
            }
        }

        Ok(result)
    }

    /// Replace a pool timeout with the error from one direct connect attempt.
    ///
    /// A free slot was already held, so the timeout means the server could
    /// not be reached. The driver's own reason is more useful than the
    /// pool's.
    async fn connect_error(&self) -> sqlx::Error {
        match MySqlConnection::connect_with(&self.pool.connect_options()).await {
            Ok(conn) => {
                let _ = conn.close().await;
                sqlx::Error::PoolTimedOut
            }
            Err(e) => e,
        }
    }
}

#[async_trait]
impl SqlExecutor for MySqlExecutor {
    async fn execute(&self, statement: &str, params: &[Value]) -> Result<ResultSet, DbError> {
        let _slot = self.slots.acquire().await.map_err(|_| DbError::PoolClosed)?;

        match self.fetch_all_results(statement, params).await {
            Err(sqlx::Error::PoolTimedOut) => Err(self.connect_error().await.into()),
            other => other.map_err(DbError::from),
        }
    }

    async fn close(&self) {
        self.slots.close();
        self.pool.close().await;
    }
}

/// Bind one JSON value with the closest MySQL type.
///
/// Arrays and objects are sent as their JSON text.
fn bind_json<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &'q Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(u) = n.as_u64() {
                query.bind(u)
            } else {
                query.bind(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => query.bind(s.as_str()),
        other => query.bind(other.to_string()),
    }
}

fn row_to_json(row: &MySqlRow) -> Result<Row, sqlx::Error> {
    let mut object = Row::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.type_info().name())?;
        object.insert(column.name().to_string(), value);
    }
    Ok(object)
}

fn decode_column(row: &MySqlRow, index: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    let raw: MySqlValueRef<'_> = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let value = match type_name {
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            Value::from(row.try_get::<i64, _>(index)?)
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => Value::from(row.try_get::<u64, _>(index)?),
        "YEAR" => Value::from(row.try_get_unchecked::<u16, _>(index)?),
        "FLOAT" => float_value(f64::from(row.try_get::<f32, _>(index)?)),
        "DOUBLE" => float_value(row.try_get::<f64, _>(index)?),
        // Exact numerics stay textual so no precision is lost
        "DECIMAL" => Value::String(row.try_get_unchecked::<String, _>(index)?),
        "DATE" => Value::String(
            row.try_get::<chrono::NaiveDate, _>(index)?
                .format("%Y-%m-%d")
                .to_string(),
        ),
        "DATETIME" => Value::String(
            row.try_get::<chrono::NaiveDateTime, _>(index)?
                .format("%Y-%m-%dT%H:%M:%S%.f")
                .to_string(),
        ),
        "TIMESTAMP" => Value::String(
            row.try_get::<chrono::DateTime<chrono::Utc>, _>(index)?
                .to_rfc3339(),
        ),
        "TIME" => Value::String(
            row.try_get::<sqlx::mysql::types::MySqlTime, _>(index)?
                .to_string(),
        ),
        "JSON" => row.try_get::<Value, _>(index)?,
        "CHAR" | "VARCHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET" => {
            Value::String(row.try_get_unchecked::<String, _>(index)?)
        }
        _ => bytes_value(row.try_get_unchecked::<Vec<u8>, _>(index)?),
    };

    Ok(value)
}

/// NaN and infinities have no JSON form and become null.
fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Binary columns: text when valid UTF-8, byte array otherwise.
fn bytes_value(bytes: Vec<u8>) -> Value {
    match String::from_utf8(bytes) {
        Ok(text) => Value::String(text),
        Err(err) => Value::Array(err.into_bytes().into_iter().map(Value::from).collect()),
    }
}
