//! Single-consumer worker loop driving a job queue

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::Result;

use super::job_queue::{JobEnvelope, JobReceiver};

/// Thread-safe view of the job a worker loop is currently executing.
///
/// Owned by the loop instance; `None` whenever no job is in flight.
#[derive(Clone, Default)]
pub struct CurrentJob {
    inner: Arc<RwLock<Option<Uuid>>>,
}

impl CurrentJob {
    pub fn get(&self) -> Option<Uuid> {
        *self.inner.read()
    }

    fn set(&self, job_id: Uuid) {
        *self.inner.write() = Some(job_id);
    }

    fn clear(&self) {
        *self.inner.write() = None;
    }
}

/// Handler executed for every job of one kind
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    type Payload: Send + 'static;

    /// Job kind, for logging
    fn kind(&self) -> &'static str;

    /// Process one job. Handlers finalize their own records on failure;
    /// an `Err` here is logged by the loop and never propagated further.
    async fn handle(&self, job: JobEnvelope<Self::Payload>) -> Result<()>;
}

/// Drives a queue with exactly one in-flight job at a time.
///
/// Shutdown is cooperative: the stop signal is honored between jobs, never
/// mid-job.
pub struct WorkerLoop<H: JobHandler> {
    handler: Arc<H>,
    receiver: JobReceiver<H::Payload>,
    current: CurrentJob,
    shutdown: watch::Receiver<bool>,
}

impl<H: JobHandler> WorkerLoop<H> {
    pub fn new(
        handler: Arc<H>,
        receiver: JobReceiver<H::Payload>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            handler,
            receiver,
            current: CurrentJob::default(),
            shutdown,
        }
    }

    /// Handle to the loop's current-job state
    pub fn current_job(&self) -> CurrentJob {
        self.current.clone()
    }

    /// Run until the queue closes or shutdown is signalled
    pub async fn run(mut self) {
        let kind = self.handler.kind();
        tracing::info!(kind, "worker loop started");

        loop {
            tokio::select! {
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
                job = self.receiver.recv() => {
                    let Some(job) = job else { break };
                    self.execute(job).await;
                }
            }
        }

        tracing::info!(kind, "worker loop stopped");
    }

    async fn execute(&self, job: JobEnvelope<H::Payload>) {
        let kind = self.handler.kind();
        let job_id = job.job_id;

        self.current.set(job_id);
        tracing::info!(kind, %job_id, "job started");

        // A failing handler has already finalized its record; the loop
        // only logs and moves on so one bad job never halts the kind.
        if let Err(e) = self.handler.handle(job).await {
            tracing::error!(kind, %job_id, error = %e, "job handler failed");
        } else {
            tracing::info!(kind, %job_id, "job finished");
        }

        self.current.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::processing::job_queue::JobQueue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingHandler {
        seen: AtomicUsize,
        fail_on: Option<u32>,
    }

    #[async_trait]
    impl JobHandler for CountingHandler {
        type Payload = u32;

        fn kind(&self) -> &'static str {
            "counting"
        }

        async fn handle(&self, job: JobEnvelope<u32>) -> Result<()> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(job.payload) {
                return Err(Error::Internal("boom".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_job_does_not_halt_loop() {
        let (queue, receiver) = JobQueue::new("counting", 0);
        let (_stop_tx, stop_rx) = watch::channel(false);
        let handler = Arc::new(CountingHandler {
            seen: AtomicUsize::new(0),
            fail_on: Some(2),
        });
        let worker = WorkerLoop::new(handler.clone(), receiver, stop_rx);
        let task = tokio::spawn(worker.run());

        for payload in [1, 2, 3] {
            queue.enqueue(payload).await.unwrap();
        }
        drop(queue);
        task.await.unwrap();

        assert_eq!(handler.seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_shutdown_between_jobs() {
        let (queue, receiver) = JobQueue::<u32>::new("counting", 0);
        let (stop_tx, stop_rx) = watch::channel(false);
        let handler = Arc::new(CountingHandler {
            seen: AtomicUsize::new(0),
            fail_on: None,
        });
        let worker = WorkerLoop::new(handler.clone(), receiver, stop_rx);
        let task = tokio::spawn(worker.run());

        queue.enqueue(1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop_tx.send(true).unwrap();
        task.await.unwrap();

        assert_eq!(handler.seen.load(Ordering::SeqCst), 1);
    }

    struct BlockingHandler {
        release: tokio::sync::Semaphore,
        started: AtomicUsize,
    }

    #[async_trait]
    impl JobHandler for BlockingHandler {
        type Payload = u32;

        fn kind(&self) -> &'static str {
            "blocking"
        }

        async fn handle(&self, _job: JobEnvelope<u32>) -> Result<()> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let permit = self
                .release
                .acquire()
                .await
                .map_err(|e| Error::Internal(e.to_string()))?;
            permit.forget();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_one_job_in_flight_at_a_time() {
        let (queue, receiver) = JobQueue::new("blocking", 0);
        let (_stop_tx, stop_rx) = watch::channel(false);
        let handler = Arc::new(BlockingHandler {
            release: tokio::sync::Semaphore::new(0),
            started: AtomicUsize::new(0),
        });
        let worker = WorkerLoop::new(handler.clone(), receiver, stop_rx);
        let current = worker.current_job();
        let task = tokio::spawn(worker.run());

        let first = queue.enqueue(1).await.unwrap();
        let second = queue.enqueue(2).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The second job must not start while the first is current.
        assert_eq!(handler.started.load(Ordering::SeqCst), 1);
        assert_eq!(current.get(), Some(first));

        handler.release.add_permits(1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(handler.started.load(Ordering::SeqCst), 2);
        assert_eq!(current.get(), Some(second));

        handler.release.add_permits(1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(current.get(), None);

        drop(queue);
        task.await.unwrap();
    }
}
