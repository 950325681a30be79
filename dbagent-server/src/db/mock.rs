//! Scripted executor for tests
//!
//! Replies are matched by substring against the submitted statement, first
//! match wins. Unmatched statements succeed with no rows. Every call is
//! recorded so tests can assert on the exact statement and bindings.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::executor::{DbError, ResultSet, Row, SqlExecutor};

/// Canned outcome for a matched statement
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return these rows
    Rows(Vec<Row>),
    /// Return a single row `{<column>: params[0]}`
    EchoFirstParam { column: String },
    /// Return a result header with no rows
    Affected { rows: u64, insert_id: u64 },
    /// Fail with this driver message
    Error(String),
    /// Panic inside the executor
    Panic(String),
}

/// Mock executor for testing
#[derive(Default)]
pub struct MockExecutor {
    replies: Mutex<Vec<(String, MockReply)>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `reply` to statements containing `fragment`
    pub fn on(self, fragment: &str, reply: MockReply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push((fragment.to_string(), reply));
        self
    }

    /// Statements and bindings received so far, oldest first
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    fn reply_for(&self, statement: &str) -> Option<MockReply> {
        self.replies
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _)| statement.contains(fragment.as_str()))
            .map(|(_, reply)| reply.clone())
    }
}

#[async_trait]
impl SqlExecutor for MockExecutor {
    async fn execute(&self, statement: &str, params: &[Value]) -> Result<ResultSet, DbError> {
        self.calls
            .lock()
            .unwrap()
            .push((statement.to_string(), params.to_vec()));

        match self.reply_for(statement) {
            None => Ok(ResultSet::default()),
            Some(MockReply::Rows(rows)) => Ok(ResultSet::from_rows(rows)),
            Some(MockReply::EchoFirstParam { column }) => {
                let mut row = Row::new();
                row.insert(column, params.first().cloned().unwrap_or(Value::Null));
                Ok(ResultSet::from_rows(vec![row]))
            }
            Some(MockReply::Affected { rows, insert_id }) => Ok(ResultSet {
                rows: Vec::new(),
                rows_affected: rows,
                last_insert_id: insert_id,
            }),
            Some(MockReply::Error(message)) => Err(DbError::Driver(message)),
            Some(MockReply::Panic(message)) => panic!("{}", message),
        }
    }
}

/// Build a row from `(column, value)` pairs
pub fn row<I, K>(pairs: I) -> Row
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn unmatched_statement_returns_empty_result() {
        let mock = MockExecutor::new();
        let result = mock.execute("SELECT 1", &[]).await.unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn first_matching_fragment_wins() {
        let mock = MockExecutor::new()
            .on("FROM user", MockReply::Rows(vec![row([("userid", json!(1))])]))
            .on("FROM", MockReply::Error("unreachable".into()));

        let result = mock.execute("SELECT * FROM user", &[]).await.unwrap();
        assert_eq!(result.rows[0]["userid"], json!(1));
    }

    #[tokio::test]
    async fn echo_returns_first_binding() {
        let mock = MockExecutor::new().on(
            "SELECT ?",
            MockReply::EchoFirstParam {
                column: "param".into(),
            },
        );

        let result = mock
            .execute("SELECT ? as param", &[json!("test_value")])
            .await
            .unwrap();
        assert_eq!(result.rows, vec![row([("param", json!("test_value"))])]);
        assert_eq!(mock.calls()[0].1, vec![json!("test_value")]);
    }

    #[tokio::test]
    async fn error_reply_surfaces_driver_message() {
        let mock = MockExecutor::new().on("INVALID", MockReply::Error("Invalid SQL syntax".into()));
        let err = mock.execute("INVALID SQL QUERY", &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid SQL syntax");
    }
}
