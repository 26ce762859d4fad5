//! Notification delivery with bounded retry
//!
//! The dispatch queue carries wake-up triggers rather than work items: on
//! every trigger the handler drains all currently-due records in pickup
//! order (priority first, then age), so duplicate triggers are harmless.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::NotificationConfig;
use crate::error::{Error, Result};
use crate::processing::{JobEnvelope, JobHandler, JobQueue};
use crate::providers::{EmailMessage, NotificationStore, Transport};
use crate::status::StatusTracker;
use crate::types::NotificationRecord;

/// Payload of a notification dispatch trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDispatch {
    pub notification_id: Uuid,
}

/// Delivers due notifications through the transport, retrying failed
/// deliveries with exponential backoff until the record's retry budget is
/// exhausted.
pub struct NotificationHandler {
    notifications: Arc<dyn NotificationStore>,
    status: Arc<StatusTracker>,
    transport: Arc<dyn Transport>,
    queue: JobQueue<NotificationDispatch>,
    retry_base_delay: Duration,
}

impl NotificationHandler {
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        status: Arc<StatusTracker>,
        transport: Arc<dyn Transport>,
        queue: JobQueue<NotificationDispatch>,
        config: &NotificationConfig,
    ) -> Self {
        Self {
            notifications,
            status,
            transport,
            queue,
            retry_base_delay: Duration::from_secs(config.retry_base_delay_secs),
        }
    }

    /// Delay before the next attempt: base doubled per prior failure
    fn retry_delay(&self, retry_count: u32) -> Duration {
        self.retry_base_delay * 2u32.saturating_pow(retry_count.saturating_sub(1))
    }

    /// Re-dispatch once the record becomes due again. The sleep runs on a
    /// detached task so the loop keeps serving other notifications.
    fn schedule_redispatch(&self, notification_id: Uuid, delay: Duration) {
        let queue = self.queue.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = queue.enqueue(NotificationDispatch { notification_id }).await {
                tracing::error!(%notification_id, error = %e, "failed to re-dispatch notification");
            }
        });
    }

    /// One delivery attempt. Delivery failures are absorbed into the retry
    /// state machine; only storage errors propagate.
    async fn deliver(&self, record: NotificationRecord) -> Result<()> {
        let notification_id = record.notification_id;
        self.status.notification_processing(notification_id).await?;

        let message = EmailMessage {
            recipients: record.recipients.clone(),
            subject: record.subject.clone(),
            body: record.body.clone(),
        };
        tracing::info!(
            %notification_id,
            transport = self.transport.name(),
            recipients = record.recipients.len(),
            attempt = record.retry_count + 1,
            "delivering notification"
        );

        match self.transport.send(&message).await {
            Ok(()) => self.status.notification_sent(notification_id).await,
            Err(e) => {
                let attempts = record.retry_count + 1;
                if attempts < record.max_retries {
                    let delay = self.retry_delay(attempts);
                    let scheduled_at = if delay.is_zero() {
                        None
                    } else {
                        Some(
                            Utc::now()
                                + chrono::Duration::from_std(delay)
                                    .unwrap_or_else(|_| chrono::Duration::zero()),
                        )
                    };
                    self.status
                        .notification_retry(notification_id, &e.to_string(), scheduled_at)
                        .await?;
                    if !delay.is_zero() {
                        self.schedule_redispatch(notification_id, delay);
                    }
                } else {
                    let cause = format!("{}: {}", Error::RetryExhausted(attempts), e);
                    self.status
                        .notification_failed(notification_id, &cause)
                        .await?;
                }
                Ok(())
            }
        }
    }
}

#[async_trait]
impl JobHandler for NotificationHandler {
    type Payload = NotificationDispatch;

    fn kind(&self) -> &'static str {
        "notification"
    }

    async fn handle(&self, job: JobEnvelope<NotificationDispatch>) -> Result<()> {
        tracing::debug!(
            notification_id = %job.payload.notification_id,
            "dispatch trigger received"
        );

        // Drain everything due right now. With a zero base delay a failing
        // record stays due and is retried within the same sweep until its
        // budget runs out.
        loop {
            let now = Utc::now();
            let Some(record) = self.notifications.next_due(now).await? else {
                break;
            };
            self.deliver(record).await?;
        }
        Ok(())
    }
}
