//! Ingested dataset rows

use serde::{Deserialize, Serialize};

/// One ingested row of a task's dataset.
///
/// `entity_ref` is the row's position in the source file, assigned during
/// ingestion, so a replayed load produces the same references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRow {
    /// Stable row reference within the task's dataset
    pub entity_ref: i64,
    /// Column name to cell value
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl DatasetRow {
    /// Look up a cell value by column name
    pub fn value(&self, column: &str) -> Option<&str> {
        self.fields.get(column).and_then(|v| v.as_str())
    }

    /// Full row snapshot as a JSON object
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::Value::Object(self.fields.clone())
    }
}
