//! The screening engine facade
//!
//! Owns the three job queues, their worker loops and the scoring pool.
//! The surrounding application enqueues work and polls record status; it
//! never touches the queues directly.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::ingestion::{IngestionHandler, IngestionRequest};
use crate::notification::{NotificationDispatch, NotificationHandler};
use crate::processing::{
    CurrentJob, JobQueue, RecoveryLoader, RecoveryReport, ScoringPool, WorkerLoop,
};
use crate::providers::{
    DatasetStore, NotificationStore, SearchStore, SourceStore, TaskStore, Transport,
};
use crate::screening::{SearchHandler, SearchParams, SearchRequest};
use crate::status::StatusTracker;
use crate::types::SearchKind;

/// Collaborators supplied by the surrounding application
pub struct Collaborators {
    pub sources: Arc<dyn SourceStore>,
    pub datasets: Arc<dyn DatasetStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub searches: Arc<dyn SearchStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub transport: Arc<dyn Transport>,
}

/// Background-processing engine: one worker loop per job kind
pub struct ScreeningEngine {
    ingestion_queue: JobQueue<IngestionRequest>,
    search_queue: JobQueue<SearchRequest>,
    notification_queue: JobQueue<NotificationDispatch>,
    current_ingestion: CurrentJob,
    current_search: CurrentJob,
    recovery: RecoveryLoader,
    shutdown: watch::Sender<bool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ScreeningEngine {
    /// Wire up queues, handlers and worker loops, and start the loops
    pub fn start(config: EngineConfig, collaborators: Collaborators) -> Result<Self> {
        let Collaborators {
            sources,
            datasets,
            tasks,
            searches,
            notifications,
            transport,
        } = collaborators;

        let status = Arc::new(StatusTracker::new(
            tasks.clone(),
            searches.clone(),
            notifications.clone(),
        ));
        let pool = Arc::new(ScoringPool::new(config.scoring.pool_threads)?);

        let (ingestion_queue, ingestion_rx) =
            JobQueue::new("ingestion", config.queues.ingestion_capacity);
        let (search_queue, search_rx) = JobQueue::new("search", config.queues.search_capacity);
        let (notification_queue, notification_rx) =
            JobQueue::new("notification", config.queues.notification_capacity);

        let (shutdown, shutdown_rx) = watch::channel(false);

        let ingestion_handler = Arc::new(IngestionHandler::new(
            sources,
            datasets.clone(),
            status.clone(),
            &config.ingestion,
        ));
        let search_handler = Arc::new(SearchHandler::new(datasets, status.clone(), pool));
        let notification_handler = Arc::new(NotificationHandler::new(
            notifications.clone(),
            status,
            transport,
            notification_queue.clone(),
            &config.notification,
        ));

        let ingestion_loop =
            WorkerLoop::new(ingestion_handler, ingestion_rx, shutdown_rx.clone());
        let search_loop = WorkerLoop::new(search_handler, search_rx, shutdown_rx.clone());
        let notification_loop =
            WorkerLoop::new(notification_handler, notification_rx, shutdown_rx);

        let current_ingestion = ingestion_loop.current_job();
        let current_search = search_loop.current_job();

        let workers = vec![
            tokio::spawn(ingestion_loop.run()),
            tokio::spawn(search_loop.run()),
            tokio::spawn(notification_loop.run()),
        ];

        let recovery = RecoveryLoader::new(
            tasks,
            searches,
            notifications,
            ingestion_queue.clone(),
            search_queue.clone(),
            notification_queue.clone(),
        );

        tracing::info!("screening engine started");
        Ok(Self {
            ingestion_queue,
            search_queue,
            notification_queue,
            current_ingestion,
            current_search,
            recovery,
            shutdown,
            workers: Mutex::new(workers),
        })
    }

    /// Queue a CSV source for ingestion; returns the job id immediately
    pub async fn enqueue_ingestion(&self, task_id: Uuid, source_ref: String) -> Result<Uuid> {
        self.ingestion_queue
            .enqueue(IngestionRequest {
                task_id,
                source_ref,
            })
            .await
    }

    /// Queue a screening search; returns the job id immediately
    pub async fn enqueue_search(
        &self,
        search_id: Uuid,
        kind: SearchKind,
        params: SearchParams,
    ) -> Result<Uuid> {
        self.search_queue
            .enqueue(SearchRequest {
                search_id,
                kind,
                params,
            })
            .await
    }

    /// Queue a notification for delivery; returns the job id immediately
    pub async fn enqueue_notification(&self, notification_id: Uuid) -> Result<Uuid> {
        self.notification_queue
            .enqueue(NotificationDispatch { notification_id })
            .await
    }

    /// Job id of the ingestion job currently executing, if any
    pub fn current_ingestion_job(&self) -> Option<Uuid> {
        self.current_ingestion.get()
    }

    /// Job id of the search job currently executing, if any
    pub fn current_search_job(&self) -> Option<Uuid> {
        self.current_search.get()
    }

    /// Re-enqueue all persisted non-terminal records (startup recovery)
    pub async fn recover(&self) -> Result<RecoveryReport> {
        self.recovery.run().await
    }

    /// Cooperative shutdown: each loop finishes its in-flight job, then
    /// stops
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        let workers: Vec<JoinHandle<()>> = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "worker task join failed");
            }
        }
        tracing::info!("screening engine stopped");
    }
}
