//! Outbound message transport trait

use async_trait::async_trait;

/// An email ready for delivery
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Delivery transport (SMTP relay, provider API, ...), implemented by the
/// surrounding application
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver the message. A `Err(Error::Delivery(_))` counts against the
    /// record's retry budget.
    async fn send(&self, message: &EmailMessage) -> crate::error::Result<()>;

    /// Transport name for logging
    fn name(&self) -> &str;
}
