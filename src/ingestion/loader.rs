//! CSV-to-store ingestion job handler

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::config::IngestionConfig;
use crate::error::Result;
use crate::processing::{JobEnvelope, JobHandler};
use crate::providers::{DatasetStore, SourceStore};
use crate::status::StatusTracker;
use crate::types::DatasetRow;

use super::delimiter;
use super::source_cache::SourceCache;

/// Payload of an ingestion job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionRequest {
    pub task_id: Uuid,
    pub source_ref: String,
}

struct LoadedDataset {
    column_names: Vec<String>,
    total_rows: u64,
}

/// Loads an uploaded CSV source into the dataset store and finalizes the
/// task record either way. The handler is safe to replay: previously
/// written rows for the task are cleared first, and the source artifact is
/// only deleted after the terminal status is durably recorded.
pub struct IngestionHandler {
    sources: Arc<dyn SourceStore>,
    datasets: Arc<dyn DatasetStore>,
    status: Arc<StatusTracker>,
    cache: SourceCache,
    batch_size: usize,
    sniff_sample_bytes: usize,
}

impl IngestionHandler {
    pub fn new(
        sources: Arc<dyn SourceStore>,
        datasets: Arc<dyn DatasetStore>,
        status: Arc<StatusTracker>,
        config: &IngestionConfig,
    ) -> Self {
        Self {
            sources,
            datasets,
            status,
            cache: SourceCache::new(config.source_cache_capacity),
            batch_size: config.batch_size.max(1),
            sniff_sample_bytes: config.sniff_sample_bytes.max(64),
        }
    }

    async fn fetch_source(&self, source_ref: &str) -> Result<Bytes> {
        if let Some(data) = self.cache.get(source_ref) {
            tracing::debug!(source_ref, "source cache hit");
            return Ok(data);
        }
        let data = self.sources.fetch_bytes(source_ref).await?;
        self.cache.put(source_ref, data.clone());
        Ok(data)
    }

    async fn load(&self, request: &IngestionRequest) -> Result<LoadedDataset> {
        let data = self.fetch_source(&request.source_ref).await?;
        let delimiter = delimiter::detect(&data, self.sniff_sample_bytes)?;

        // Replay safety: a crash mid-ingestion leaves partial batches
        // behind, and recovery re-runs the whole job.
        let stale = self.datasets.delete_rows(request.task_id).await?;
        if stale > 0 {
            tracing::info!(task_id = %request.task_id, stale, "cleared rows from a previous attempt");
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(data.as_ref());
        let column_names: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut batch: Vec<DatasetRow> = Vec::with_capacity(self.batch_size);
        let mut total_rows = 0u64;
        for record in reader.records() {
            let record = record?;
            let mut fields = serde_json::Map::with_capacity(column_names.len());
            for (index, column) in column_names.iter().enumerate() {
                fields.insert(
                    column.clone(),
                    serde_json::Value::String(record.get(index).unwrap_or("").to_string()),
                );
            }
            batch.push(DatasetRow {
                entity_ref: total_rows as i64,
                fields,
            });
            total_rows += 1;

            if batch.len() >= self.batch_size {
                self.datasets
                    .insert_batch(request.task_id, &batch)
                    .await?;
                batch.clear();
            }
        }
        if !batch.is_empty() {
            self.datasets
                .insert_batch(request.task_id, &batch)
                .await?;
        }

        tracing::info!(
            task_id = %request.task_id,
            total_rows,
            columns = column_names.len(),
            "dataset loaded"
        );
        Ok(LoadedDataset {
            column_names,
            total_rows,
        })
    }

    /// Delete the consumed source artifact; runs only after the terminal
    /// status write. Failures are logged, never escalated.
    async fn cleanup_source(&self, source_ref: &str) {
        self.cache.invalidate(source_ref);
        if let Err(e) = self.sources.delete(source_ref).await {
            tracing::warn!(source_ref, error = %e, "failed to delete source artifact");
        }
    }
}

#[async_trait]
impl JobHandler for IngestionHandler {
    type Payload = IngestionRequest;

    fn kind(&self) -> &'static str {
        "ingestion"
    }

    async fn handle(&self, job: JobEnvelope<IngestionRequest>) -> Result<()> {
        let request = job.payload;
        let started = Instant::now();

        let outcome = self.load(&request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(loaded) => {
                self.status
                    .complete_task(
                        request.task_id,
                        loaded.column_names,
                        loaded.total_rows,
                        elapsed_ms,
                    )
                    .await?;
            }
            Err(e) => {
                tracing::error!(task_id = %request.task_id, error = %e, "ingestion failed");
                self.status
                    .fail_task(request.task_id, &e.to_string(), elapsed_ms)
                    .await?;
            }
        }

        self.cleanup_source(&request.source_ref).await;
        Ok(())
    }
}
