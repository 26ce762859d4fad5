//! Startup recovery: re-enqueue persisted non-terminal records
//!
//! An interrupted job may have run partway; handlers are idempotent with
//! respect to destructive side effects, so redoing a record from scratch
//! is safe.

use std::sync::Arc;

use crate::error::Result;
use crate::ingestion::IngestionRequest;
use crate::notification::NotificationDispatch;
use crate::providers::{NotificationStore, SearchStore, TaskStore};
use crate::screening::SearchRequest;

use super::job_queue::JobQueue;

/// Counts of re-enqueued records per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub tasks: usize,
    pub searches: usize,
    pub notifications: usize,
}

/// Scans the record stores and re-primes the queues after a restart
pub struct RecoveryLoader {
    tasks: Arc<dyn TaskStore>,
    searches: Arc<dyn SearchStore>,
    notifications: Arc<dyn NotificationStore>,
    ingestion_queue: JobQueue<IngestionRequest>,
    search_queue: JobQueue<SearchRequest>,
    notification_queue: JobQueue<NotificationDispatch>,
}

impl RecoveryLoader {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        searches: Arc<dyn SearchStore>,
        notifications: Arc<dyn NotificationStore>,
        ingestion_queue: JobQueue<IngestionRequest>,
        search_queue: JobQueue<SearchRequest>,
        notification_queue: JobQueue<NotificationDispatch>,
    ) -> Self {
        Self {
            tasks,
            searches,
            notifications,
            ingestion_queue,
            search_queue,
            notification_queue,
        }
    }

    /// Re-enqueue one job per non-terminal record
    pub async fn run(&self) -> Result<RecoveryReport> {
        let mut report = RecoveryReport::default();

        for task in self.tasks.list_non_terminal().await? {
            tracing::info!(task_id = %task.task_id, "recovering ingestion task");
            self.ingestion_queue
                .enqueue(IngestionRequest {
                    task_id: task.task_id,
                    source_ref: task.source_ref.clone(),
                })
                .await?;
            report.tasks += 1;
        }

        for search in self.searches.list_non_terminal().await? {
            tracing::info!(search_id = %search.search_id, "recovering search");
            self.search_queue
                .enqueue(SearchRequest::from_record(&search))
                .await?;
            report.searches += 1;
        }

        for notification in self.notifications.list_non_terminal().await? {
            tracing::info!(
                notification_id = %notification.notification_id,
                "recovering notification"
            );
            self.notification_queue
                .enqueue(NotificationDispatch {
                    notification_id: notification.notification_id,
                })
                .await?;
            report.notifications += 1;
        }

        if report != RecoveryReport::default() {
            tracing::info!(
                tasks = report.tasks,
                searches = report.searches,
                notifications = report.notifications,
                "recovery re-enqueued interrupted work"
            );
        }
        Ok(report)
    }
}
