//! Uniform JSON response body
//!
//! `{success, data?, count?, error?, procedure?, message?}` plus the result
//! header fields for statements that changed rows without returning any.

use serde::Serialize;
use serde_json::Value;

use crate::db::{ResultSet, Row};

/// Response envelope shared by every endpoint except status
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procedure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_id: Option<u64>,
}

impl Envelope {
    /// Row set with its count
    pub fn rows(result: ResultSet) -> Self {
        let wrote_rows = result.rows.is_empty()
            && (result.rows_affected > 0 || result.last_insert_id > 0);
        let count = result.rows.len();

        Self {
            success: true,
            data: Some(Value::Array(result.rows.into_iter().map(Value::Object).collect())),
            count: Some(count),
            affected_rows: wrote_rows.then_some(result.rows_affected),
            insert_id: wrote_rows.then_some(result.last_insert_id),
            ..Self::default()
        }
    }

    /// A single row, not wrapped in an array
    pub fn single(row: Row) -> Self {
        Self {
            success: true,
            data: Some(Value::Object(row)),
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn with_procedure(mut self, name: impl Into<String>) -> Self {
        self.procedure = Some(name.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::row;
    use serde_json::json;

    #[test]
    fn rows_envelope_counts_data() {
        let result = ResultSet::from_rows(vec![row([("param", json!("test_value"))])]);
        let body = serde_json::to_value(Envelope::rows(result)).unwrap();

        assert_eq!(
            body,
            json!({"success": true, "data": [{"param": "test_value"}], "count": 1})
        );
    }

    #[test]
    fn write_statements_report_result_header() {
        let result = ResultSet {
            rows: vec![],
            rows_affected: 1,
            last_insert_id: 7,
        };
        let body = serde_json::to_value(Envelope::rows(result)).unwrap();

        assert_eq!(
            body,
            json!({"success": true, "data": [], "count": 0, "affectedRows": 1, "insertId": 7})
        );
    }

    #[test]
    fn empty_select_has_no_result_header() {
        let body = serde_json::to_value(Envelope::rows(ResultSet::default())).unwrap();
        assert_eq!(body, json!({"success": true, "data": [], "count": 0}));
    }

    #[test]
    fn failure_has_only_error() {
        let body = serde_json::to_value(Envelope::failure("Endpoint not found")).unwrap();
        assert_eq!(body, json!({"success": false, "error": "Endpoint not found"}));
    }
}
