//! Lifecycle record storage traits

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::types::{NotificationRecord, SearchRecord, TaskRecord};

/// Store of ingestion task records
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn read(&self, task_id: Uuid) -> Result<Option<TaskRecord>>;

    /// Persist the record, replacing any previous version
    async fn write(&self, record: &TaskRecord) -> Result<()>;

    /// Records not yet in a terminal state, oldest first
    async fn list_non_terminal(&self) -> Result<Vec<TaskRecord>>;
}

/// Store of search records
#[async_trait]
pub trait SearchStore: Send + Sync {
    async fn read(&self, search_id: Uuid) -> Result<Option<SearchRecord>>;

    async fn write(&self, record: &SearchRecord) -> Result<()>;

    async fn list_non_terminal(&self) -> Result<Vec<SearchRecord>>;
}

/// Store of notification records
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn read(&self, notification_id: Uuid) -> Result<Option<NotificationRecord>>;

    async fn write(&self, record: &NotificationRecord) -> Result<()>;

    async fn list_non_terminal(&self) -> Result<Vec<NotificationRecord>>;

    /// The next record eligible for pickup at `now`: status pending or
    /// retry, not scheduled in the future, never sent. Ordered by priority
    /// (high first), then `created_at` (oldest first).
    async fn next_due(&self, now: DateTime<Utc>) -> Result<Option<NotificationRecord>>;
}
