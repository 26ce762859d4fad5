//! Outbound notification records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery priority; higher is picked up first
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
}

impl NotificationPriority {
    /// Numeric rank used for pickup ordering
    pub fn rank(&self) -> u8 {
        match self {
            NotificationPriority::Low => 0,
            NotificationPriority::Normal => 1,
            NotificationPriority::High => 2,
        }
    }

    pub fn from_rank(rank: u8) -> Self {
        match rank {
            0 => NotificationPriority::Low,
            2 => NotificationPriority::High,
            _ => NotificationPriority::Normal,
        }
    }
}

/// Notification lifecycle: pending -> processing -> {sent | retry | failed}
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Processing,
    Sent,
    Retry,
    Failed,
}

impl NotificationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, NotificationStatus::Sent | NotificationStatus::Failed)
    }
}

/// Record of an outbound email notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Unique notification ID
    pub notification_id: Uuid,
    /// Recipient addresses
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
    pub priority: NotificationPriority,
    pub status: NotificationStatus,
    /// Delivery attempts that have failed so far
    pub retry_count: u32,
    /// Retry budget; `retry_count` never exceeds it
    pub max_retries: u32,
    /// Not eligible for pickup before this instant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    /// When delivery succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    /// Last delivery error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationRecord {
    /// Create a new pending notification
    pub fn new(
        notification_id: Uuid,
        recipients: Vec<String>,
        subject: String,
        body: String,
        priority: NotificationPriority,
        max_retries: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            notification_id,
            recipients,
            subject,
            body,
            priority,
            status: NotificationStatus::Pending,
            retry_count: 0,
            max_retries,
            scheduled_at: None,
            sent_at: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this record is eligible for pickup at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        matches!(
            self.status,
            NotificationStatus::Pending | NotificationStatus::Retry
        ) && self.scheduled_at.map_or(true, |at| at <= now)
            && self.sent_at.is_none()
    }

    /// Mark the record as picked up by the dispatcher
    pub fn mark_processing(&mut self) {
        self.status = NotificationStatus::Processing;
        self.updated_at = Utc::now();
    }

    /// Mark delivery as succeeded
    pub fn mark_sent(&mut self) {
        self.status = NotificationStatus::Sent;
        self.sent_at = Some(Utc::now());
        self.error_message = None;
        self.updated_at = Utc::now();
    }

    /// Record a failed attempt that still has retry budget
    pub fn mark_retry(&mut self, error_message: String, scheduled_at: Option<DateTime<Utc>>) {
        self.status = NotificationStatus::Retry;
        self.retry_count += 1;
        self.error_message = Some(error_message);
        self.scheduled_at = scheduled_at;
        self.updated_at = Utc::now();
    }

    /// Record a failed attempt that exhausted the retry budget (terminal)
    pub fn mark_failed(&mut self, error_message: String) {
        self.status = NotificationStatus::Failed;
        self.retry_count += 1;
        self.error_message = Some(error_message);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_checks() {
        let mut record = NotificationRecord::new(
            Uuid::new_v4(),
            vec!["ops@example.com".to_string()],
            "subject".to_string(),
            "body".to_string(),
            NotificationPriority::Normal,
            3,
        );
        let now = Utc::now();
        assert!(record.is_due(now));

        record.scheduled_at = Some(now + chrono::Duration::seconds(60));
        assert!(!record.is_due(now));

        record.scheduled_at = Some(now - chrono::Duration::seconds(1));
        assert!(record.is_due(now));

        record.mark_sent();
        assert!(!record.is_due(now));
    }

    #[test]
    fn test_priority_rank_round_trip() {
        for p in [
            NotificationPriority::Low,
            NotificationPriority::Normal,
            NotificationPriority::High,
        ] {
            assert_eq!(NotificationPriority::from_rank(p.rank()), p);
        }
    }
}
