//! Ingested dataset storage trait

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::DatasetRow;

/// Store of ingested rows, partitioned by task
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Insert a batch of rows for a task. Rows carry their own
    /// `entity_ref`, so replaying a batch overwrites rather than duplicates.
    async fn insert_batch(&self, task_id: Uuid, rows: &[DatasetRow]) -> Result<()>;

    /// Load the task's rows, in original row order. `columns` names the
    /// columns the caller will screen; rows are returned whole so the full
    /// record snapshot stays available.
    async fn query_rows(&self, task_id: Uuid, columns: &[String]) -> Result<Vec<DatasetRow>>;

    /// Remove all rows for a task; returns how many were removed
    async fn delete_rows(&self, task_id: Uuid) -> Result<usize>;

    /// Count rows currently stored for a task
    async fn count_rows(&self, task_id: Uuid) -> Result<u64>;
}
