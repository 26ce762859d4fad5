//! Ingestion task records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of an ingestion task
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for or undergoing ingestion
    Pending,
    /// Ingestion finished, successfully or not (see `error_message`)
    Completed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

/// Record of a CSV ingestion task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Unique task ID
    pub task_id: Uuid,
    /// Reference to the uploaded source artifact
    pub source_ref: String,
    /// Processing status
    pub status: TaskStatus,
    /// Convenience flag mirroring a terminal status
    pub is_done: bool,
    /// Column names discovered in the source header
    pub column_names: Vec<String>,
    /// Rows ingested
    pub total_rows: u64,
    /// Wall-clock ingestion time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
    /// Failure cause, if ingestion failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// Create a new pending task
    pub fn new(task_id: Uuid, source_ref: String) -> Self {
        let now = Utc::now();
        Self {
            task_id,
            source_ref,
            status: TaskStatus::Pending,
            is_done: false,
            column_names: Vec::new(),
            total_rows: 0,
            processing_time_ms: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the task completed after a successful load
    pub fn mark_completed(&mut self, column_names: Vec<String>, total_rows: u64, elapsed_ms: u64) {
        self.status = TaskStatus::Completed;
        self.is_done = true;
        self.column_names = column_names;
        self.total_rows = total_rows;
        self.processing_time_ms = Some(elapsed_ms);
        self.error_message = None;
        self.updated_at = Utc::now();
    }

    /// Mark the task completed with a failure. The task still reaches the
    /// terminal status; the cause is carried in `error_message`.
    pub fn mark_failed(&mut self, error_message: String, elapsed_ms: u64) {
        self.status = TaskStatus::Completed;
        self.is_done = true;
        self.column_names = Vec::new();
        self.total_rows = 0;
        self.processing_time_ms = Some(elapsed_ms);
        self.error_message = Some(error_message);
        self.updated_at = Utc::now();
    }
}
