//! Lifecycle status persistence
//!
//! Every status write a job handler makes goes through the tracker, which
//! enforces that records never transition out of a terminal state.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::providers::{NotificationStore, SearchStore, TaskStore};
use crate::types::{MatchOutcome, SearchSummary};

/// Persists lifecycle transitions for task, search and notification records
pub struct StatusTracker {
    tasks: Arc<dyn TaskStore>,
    searches: Arc<dyn SearchStore>,
    notifications: Arc<dyn NotificationStore>,
}

impl StatusTracker {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        searches: Arc<dyn SearchStore>,
        notifications: Arc<dyn NotificationStore>,
    ) -> Self {
        Self {
            tasks,
            searches,
            notifications,
        }
    }

    /// Record a successful ingestion
    pub async fn complete_task(
        &self,
        task_id: Uuid,
        column_names: Vec<String>,
        total_rows: u64,
        elapsed_ms: u64,
    ) -> Result<()> {
        let mut record = self
            .tasks
            .read(task_id)
            .await?
            .ok_or_else(|| Error::Storage(format!("task {} not found", task_id)))?;
        if record.status.is_terminal() {
            tracing::warn!(%task_id, "refusing transition out of terminal task status");
            return Ok(());
        }
        record.mark_completed(column_names, total_rows, elapsed_ms);
        tracing::info!(%task_id, total_rows, elapsed_ms, "task completed");
        self.tasks.write(&record).await
    }

    /// Record a failed ingestion; the task still reaches the terminal
    /// status with the cause in `error_message`
    pub async fn fail_task(&self, task_id: Uuid, error: &str, elapsed_ms: u64) -> Result<()> {
        let mut record = self
            .tasks
            .read(task_id)
            .await?
            .ok_or_else(|| Error::Storage(format!("task {} not found", task_id)))?;
        if record.status.is_terminal() {
            tracing::warn!(%task_id, "refusing transition out of terminal task status");
            return Ok(());
        }
        record.mark_failed(error.to_string(), elapsed_ms);
        tracing::warn!(%task_id, error, elapsed_ms, "task completed with error");
        self.tasks.write(&record).await
    }

    /// Mark a search as picked up
    pub async fn search_processing(&self, search_id: Uuid) -> Result<()> {
        let mut record = self
            .searches
            .read(search_id)
            .await?
            .ok_or_else(|| Error::Storage(format!("search {} not found", search_id)))?;
        if record.status.is_terminal() {
            tracing::warn!(%search_id, "refusing transition out of terminal search status");
            return Ok(());
        }
        record.mark_processing();
        self.searches.write(&record).await
    }

    /// Record a completed search with its output
    pub async fn complete_search(
        &self,
        search_id: Uuid,
        matched_records: MatchOutcome,
        summary: Option<SearchSummary>,
        total_rows: u64,
        elapsed_ms: u64,
    ) -> Result<()> {
        let mut record = self
            .searches
            .read(search_id)
            .await?
            .ok_or_else(|| Error::Storage(format!("search {} not found", search_id)))?;
        if record.status.is_terminal() {
            tracing::warn!(%search_id, "refusing transition out of terminal search status");
            return Ok(());
        }
        record.mark_completed(matched_records, summary, total_rows, elapsed_ms);
        tracing::info!(%search_id, total_rows, elapsed_ms, "search completed");
        self.searches.write(&record).await
    }

    /// Record a failed search
    pub async fn fail_search(&self, search_id: Uuid, error: &str, elapsed_ms: u64) -> Result<()> {
        let mut record = self
            .searches
            .read(search_id)
            .await?
            .ok_or_else(|| Error::Storage(format!("search {} not found", search_id)))?;
        if record.status.is_terminal() {
            tracing::warn!(%search_id, "refusing transition out of terminal search status");
            return Ok(());
        }
        record.mark_failed(error.to_string(), elapsed_ms);
        tracing::warn!(%search_id, error, "search failed");
        self.searches.write(&record).await
    }

    /// Mark a notification as picked up
    pub async fn notification_processing(&self, notification_id: Uuid) -> Result<()> {
        let mut record = self.read_notification(notification_id).await?;
        if record.status.is_terminal() {
            tracing::warn!(%notification_id, "refusing transition out of terminal notification status");
            return Ok(());
        }
        record.mark_processing();
        self.notifications.write(&record).await
    }

    /// Record a successful delivery
    pub async fn notification_sent(&self, notification_id: Uuid) -> Result<()> {
        let mut record = self.read_notification(notification_id).await?;
        if record.status.is_terminal() {
            tracing::warn!(%notification_id, "refusing transition out of terminal notification status");
            return Ok(());
        }
        record.mark_sent();
        tracing::info!(%notification_id, "notification sent");
        self.notifications.write(&record).await
    }

    /// Record a failed delivery attempt that still has retry budget
    pub async fn notification_retry(
        &self,
        notification_id: Uuid,
        error: &str,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut record = self.read_notification(notification_id).await?;
        if record.status.is_terminal() {
            tracing::warn!(%notification_id, "refusing transition out of terminal notification status");
            return Ok(());
        }
        record.mark_retry(error.to_string(), scheduled_at);
        tracing::warn!(
            %notification_id,
            retry_count = record.retry_count,
            max_retries = record.max_retries,
            error,
            "delivery failed, will retry"
        );
        self.notifications.write(&record).await
    }

    /// Record a failed delivery attempt that exhausted the retry budget
    pub async fn notification_failed(&self, notification_id: Uuid, error: &str) -> Result<()> {
        let mut record = self.read_notification(notification_id).await?;
        if record.status.is_terminal() {
            tracing::warn!(%notification_id, "refusing transition out of terminal notification status");
            return Ok(());
        }
        record.mark_failed(error.to_string());
        tracing::error!(
            %notification_id,
            retry_count = record.retry_count,
            error,
            "notification failed"
        );
        self.notifications.write(&record).await
    }

    async fn read_notification(
        &self,
        notification_id: Uuid,
    ) -> Result<crate::types::NotificationRecord> {
        self.notifications
            .read(notification_id)
            .await?
            .ok_or_else(|| Error::Storage(format!("notification {} not found", notification_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::TaskStore;
    use crate::storage::ScreeningDb;
    use crate::types::{NotificationPriority, NotificationRecord, NotificationStatus, TaskRecord};
    use std::sync::Arc;

    fn tracker() -> (Arc<ScreeningDb>, StatusTracker) {
        let db = Arc::new(ScreeningDb::in_memory().unwrap());
        let tracker = StatusTracker::new(db.clone(), db.clone(), db.clone());
        (db, tracker)
    }

    #[tokio::test]
    async fn test_terminal_task_transition_refused() {
        let (db, tracker) = tracker();
        let task_id = Uuid::new_v4();
        TaskStore::write(&*db, &TaskRecord::new(task_id, "a.csv".to_string()))
            .await
            .unwrap();

        tracker
            .complete_task(task_id, vec!["name".to_string()], 7, 12)
            .await
            .unwrap();
        // A later failure report must not rewrite the terminal record.
        tracker.fail_task(task_id, "late error", 99).await.unwrap();

        let record = TaskStore::read(&*db, task_id).await.unwrap().unwrap();
        assert_eq!(record.total_rows, 7);
        assert!(record.error_message.is_none());
    }

    #[tokio::test]
    async fn test_terminal_notification_transition_refused() {
        let (db, tracker) = tracker();
        let id = Uuid::new_v4();
        crate::providers::NotificationStore::write(
            &*db,
            &NotificationRecord::new(
                id,
                vec!["ops@example.com".to_string()],
                "s".to_string(),
                "b".to_string(),
                NotificationPriority::Normal,
                3,
            ),
        )
        .await
        .unwrap();

        tracker.notification_sent(id).await.unwrap();
        tracker.notification_failed(id, "too late").await.unwrap();

        let record = crate::providers::NotificationStore::read(&*db, id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, NotificationStatus::Sent);
        assert_eq!(record.retry_count, 0);
    }

    #[tokio::test]
    async fn test_missing_record_is_a_storage_error() {
        let (_db, tracker) = tracker();
        let err = tracker
            .fail_search(Uuid::new_v4(), "whatever", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
