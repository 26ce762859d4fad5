//! Generic async job hand-off between the API layer and a worker loop
//!
//! One queue exists per job kind; each has exactly one consumer.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{Error, Result};

/// A queued unit of work, owned by the queue until dequeued
#[derive(Debug, Clone)]
pub struct JobEnvelope<P> {
    pub job_id: Uuid,
    pub payload: P,
    pub enqueued_at: DateTime<Utc>,
}

enum Sender<P> {
    Bounded(mpsc::Sender<JobEnvelope<P>>),
    Unbounded(mpsc::UnboundedSender<JobEnvelope<P>>),
}

impl<P> Clone for Sender<P> {
    fn clone(&self) -> Self {
        match self {
            Sender::Bounded(tx) => Sender::Bounded(tx.clone()),
            Sender::Unbounded(tx) => Sender::Unbounded(tx.clone()),
        }
    }
}

enum Receiver<P> {
    Bounded(mpsc::Receiver<JobEnvelope<P>>),
    Unbounded(mpsc::UnboundedReceiver<JobEnvelope<P>>),
}

/// Producer half of a job queue; cheap to clone
pub struct JobQueue<P> {
    kind: &'static str,
    sender: Sender<P>,
}

impl<P> Clone for JobQueue<P> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            sender: self.sender.clone(),
        }
    }
}

/// Consumer half of a job queue; held by exactly one worker loop
pub struct JobReceiver<P> {
    inner: Receiver<P>,
}

impl<P: Send> JobQueue<P> {
    /// Create a queue. `capacity` of 0 means unbounded (enqueue never
    /// suspends the producer); a positive capacity applies backpressure.
    pub fn new(kind: &'static str, capacity: usize) -> (Self, JobReceiver<P>) {
        let (sender, receiver) = if capacity == 0 {
            let (tx, rx) = mpsc::unbounded_channel();
            (Sender::Unbounded(tx), Receiver::Unbounded(rx))
        } else {
            let (tx, rx) = mpsc::channel(capacity);
            (Sender::Bounded(tx), Receiver::Bounded(rx))
        };

        (Self { kind, sender }, JobReceiver { inner: receiver })
    }

    /// Append a job to the tail; returns the job id immediately
    pub async fn enqueue(&self, payload: P) -> Result<Uuid> {
        let envelope = JobEnvelope {
            job_id: Uuid::new_v4(),
            payload,
            enqueued_at: Utc::now(),
        };
        let job_id = envelope.job_id;

        match &self.sender {
            Sender::Unbounded(tx) => tx
                .send(envelope)
                .map_err(|_| Error::QueueClosed(self.kind))?,
            Sender::Bounded(tx) => tx
                .send(envelope)
                .await
                .map_err(|_| Error::QueueClosed(self.kind))?,
        }

        tracing::debug!(kind = self.kind, %job_id, "job enqueued");
        Ok(job_id)
    }

    /// Queue kind, for logging
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl<P> JobReceiver<P> {
    /// Receive the next job, suspending until one is available. Returns
    /// `None` once every producer handle has been dropped.
    pub async fn recv(&mut self) -> Option<JobEnvelope<P>> {
        match &mut self.inner {
            Receiver::Bounded(rx) => rx.recv().await,
            Receiver::Unbounded(rx) => rx.recv().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fifo_order() {
        let (queue, mut rx) = JobQueue::new("test", 0);
        let first = queue.enqueue(1u32).await.unwrap();
        let second = queue.enqueue(2u32).await.unwrap();
        assert_ne!(first, second);

        let a = rx.recv().await.unwrap();
        let b = rx.recv().await.unwrap();
        assert_eq!((a.payload, b.payload), (1, 2));
        assert_eq!(a.job_id, first);
    }

    #[tokio::test]
    async fn test_enqueue_after_consumer_dropped() {
        let (queue, rx) = JobQueue::<u32>::new("test", 0);
        drop(rx);
        assert!(matches!(
            queue.enqueue(1).await,
            Err(Error::QueueClosed("test"))
        ));
    }

    #[tokio::test]
    async fn test_bounded_backpressure() {
        let (queue, mut rx) = JobQueue::new("test", 1);
        queue.enqueue(1u32).await.unwrap();

        // Second enqueue must wait until the consumer drains one slot.
        let producer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.enqueue(2u32).await })
        };
        tokio::task::yield_now().await;
        assert!(!producer.is_finished());

        assert_eq!(rx.recv().await.unwrap().payload, 1);
        producer.await.unwrap().unwrap();
        assert_eq!(rx.recv().await.unwrap().payload, 2);
    }
}
