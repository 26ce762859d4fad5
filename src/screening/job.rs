//! Search job handler

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::processing::{JobEnvelope, JobHandler, ScoringPool};
use crate::providers::DatasetStore;
use crate::status::StatusTracker;
use crate::types::{MatchOutcome, SearchKind, SearchRecord, SearchSummary};

use super::matcher;

/// Search parameters carried alongside the record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    pub task_ref: Uuid,
    pub query_names: Vec<String>,
    pub columns: Vec<String>,
    pub threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watchlist_ref: Option<String>,
}

/// Payload of a search job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub search_id: Uuid,
    pub kind: SearchKind,
    pub params: SearchParams,
}

impl SearchRequest {
    /// Rebuild the request from a persisted record (startup recovery)
    pub fn from_record(record: &SearchRecord) -> Self {
        Self {
            search_id: record.search_id,
            kind: record.kind,
            params: SearchParams {
                task_ref: record.task_ref,
                query_names: record.query_names.clone(),
                columns: record.columns.clone(),
                threshold: record.threshold,
                watchlist_ref: record.watchlist_ref.clone(),
            },
        }
    }
}

struct SearchOutput {
    matched_records: MatchOutcome,
    summary: Option<SearchSummary>,
    total_rows: u64,
}

/// Screens query names against an ingested dataset. Scoring runs on the
/// CPU pool; the handler suspends until it returns. Failures are terminal:
/// the record is marked failed and no retry is attempted.
pub struct SearchHandler {
    datasets: Arc<dyn DatasetStore>,
    status: Arc<StatusTracker>,
    pool: Arc<ScoringPool>,
}

impl SearchHandler {
    pub fn new(
        datasets: Arc<dyn DatasetStore>,
        status: Arc<StatusTracker>,
        pool: Arc<ScoringPool>,
    ) -> Self {
        Self {
            datasets,
            status,
            pool,
        }
    }

    async fn run(&self, request: &SearchRequest) -> Result<SearchOutput> {
        self.status.search_processing(request.search_id).await?;

        let params = &request.params;
        let rows = self
            .datasets
            .query_rows(params.task_ref, &params.columns)
            .await?;
        if rows.is_empty() {
            return Err(Error::Storage(format!(
                "no ingested rows for task {}",
                params.task_ref
            )));
        }
        let total_rows = rows.len() as u64;

        let kind = request.kind;
        let query_names = params.query_names.clone();
        let columns = params.columns.clone();
        let threshold = params.threshold;

        let (matched_records, summary) = self
            .pool
            .run(move || match kind {
                SearchKind::Single => {
                    let query = query_names.first().map(String::as_str).unwrap_or("");
                    let matches = matcher::search_single(query, &columns, &rows, threshold);
                    (MatchOutcome::Single { matches }, None)
                }
                SearchKind::Bulk => {
                    let (results, summary) =
                        matcher::search_bulk(&query_names, &columns, &rows, threshold);
                    (MatchOutcome::Bulk { results }, Some(summary))
                }
            })
            .await?;

        Ok(SearchOutput {
            matched_records,
            summary,
            total_rows,
        })
    }
}

#[async_trait]
impl JobHandler for SearchHandler {
    type Payload = SearchRequest;

    fn kind(&self) -> &'static str {
        "search"
    }

    async fn handle(&self, job: JobEnvelope<SearchRequest>) -> Result<()> {
        let request = job.payload;
        let started = Instant::now();

        match self.run(&request).await {
            Ok(output) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                self.status
                    .complete_search(
                        request.search_id,
                        output.matched_records,
                        output.summary,
                        output.total_rows,
                        elapsed_ms,
                    )
                    .await?;
            }
            Err(e) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                tracing::error!(search_id = %request.search_id, error = %e, "search failed");
                self.status
                    .fail_search(request.search_id, &e.to_string(), elapsed_ms)
                    .await?;
            }
        }
        Ok(())
    }
}
