//! Configuration for the screening engine

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Queue capacities
    #[serde(default)]
    pub queues: QueueConfig,
    /// Ingestion configuration
    #[serde(default)]
    pub ingestion: IngestionConfig,
    /// Scoring pool configuration
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Notification delivery configuration
    #[serde(default)]
    pub notification: NotificationConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&raw).map_err(|e| Error::Internal(format!("invalid config: {}", e)))
    }
}

/// Per-kind queue capacity; 0 means unbounded (the default).
///
/// A positive bound applies real backpressure: producers suspend when the
/// queue is at capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default)]
    pub ingestion_capacity: usize,
    #[serde(default)]
    pub search_capacity: usize,
    #[serde(default)]
    pub notification_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            ingestion_capacity: 0,
            search_capacity: 0,
            notification_capacity: 0,
        }
    }
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Rows per dataset insert batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Capacity of the source-bytes cache
    #[serde(default = "default_cache_capacity")]
    pub source_cache_capacity: usize,
    /// Bytes sampled for delimiter sniffing
    #[serde(default = "default_sniff_sample")]
    pub sniff_sample_bytes: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            source_cache_capacity: default_cache_capacity(),
            sniff_sample_bytes: default_sniff_sample(),
        }
    }
}

/// Scoring pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Threads in the CPU scoring pool
    #[serde(default = "default_pool_threads")]
    pub pool_threads: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            pool_threads: default_pool_threads(),
        }
    }
}

/// Notification delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Retry budget applied when a record does not carry its own
    #[serde(default = "default_max_retries")]
    pub default_max_retries: u32,
    /// Base delay before the first retry; doubles per attempt. Zero keeps
    /// the retry immediately eligible.
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_max_retries: default_max_retries(),
            retry_base_delay_secs: default_retry_base_delay(),
        }
    }
}

fn default_batch_size() -> usize {
    1000
}
fn default_cache_capacity() -> usize {
    16
}
fn default_sniff_sample() -> usize {
    1024
}
fn default_pool_threads() -> usize {
    num_cpus::get().min(4)
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_base_delay() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.ingestion.batch_size, 1000);
        assert_eq!(config.queues.ingestion_capacity, 0);
        assert_eq!(config.notification.default_max_retries, 3);
        assert!(config.scoring.pool_threads >= 1);
    }

    #[test]
    fn test_partial_toml() {
        let config: EngineConfig = toml::from_str(
            r#"
            [ingestion]
            batch_size = 50

            [notification]
            retry_base_delay_secs = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.ingestion.batch_size, 50);
        assert_eq!(config.ingestion.source_cache_capacity, 16);
        assert_eq!(config.notification.retry_base_delay_secs, 0);
        assert_eq!(config.notification.default_max_retries, 3);
    }
}
