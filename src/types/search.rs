//! Name-screening search records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shape of a search request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    /// One query name, all matches above threshold returned
    Single,
    /// Many query names, best match per query plus a summary
    Bulk,
}

/// Status of a search job
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl SearchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchStatus::Completed | SearchStatus::Failed)
    }
}

/// A (row, column) pair that scored at or above the threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedRecord {
    /// The query name that produced this match
    pub query_name: String,
    /// Similarity in [0, 100]
    pub confidence: f64,
    /// Column the match was found in
    pub matched_column: String,
    /// Cell value that matched
    pub matched_value: String,
    /// Stable row reference within the task's dataset
    pub entity_ref: i64,
    /// Snapshot of the whole row
    pub full_record: serde_json::Value,
}

/// Per-query outcome of a bulk search; exactly one per input query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkQueryResult {
    pub query_name: String,
    /// Whether any candidate reached the threshold
    pub found: bool,
    /// Best confidence observed, 0.0 when nothing matched
    pub matched: f64,
    /// The winning match, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_match: Option<MatchedRecord>,
}

/// Aggregate statistics over a bulk search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSummary {
    /// Queries screened
    pub total_searched: usize,
    /// Queries with at least one kept match
    pub total_found: usize,
    /// Queries whose best match reached the threshold
    pub total_above_threshold: usize,
    /// Highest confidence seen across all queries
    pub max_confidence: f64,
}

/// Persisted match output, shaped by the search kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    Single { matches: Vec<MatchedRecord> },
    Bulk { results: Vec<BulkQueryResult> },
}

/// Record of a screening search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    /// Unique search ID
    pub search_id: Uuid,
    /// The ingested task this search runs against
    pub task_ref: Uuid,
    /// Single or bulk
    pub kind: SearchKind,
    /// Query names to screen
    pub query_names: Vec<String>,
    /// Columns to screen against
    pub columns: Vec<String>,
    /// Minimum confidence for a match, in [0, 100]
    pub threshold: f64,
    /// Optional grouping tag for bulk reporting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watchlist_ref: Option<String>,
    /// Processing status
    pub status: SearchStatus,
    /// Rows screened
    pub total_rows: u64,
    /// Wall-clock execution time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
    /// Match output, populated on completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_records: Option<MatchOutcome>,
    /// Bulk summary, populated on completion of a bulk search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SearchSummary>,
    /// Failure cause, if the search failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SearchRecord {
    /// Create a new pending search
    pub fn new(
        search_id: Uuid,
        task_ref: Uuid,
        kind: SearchKind,
        query_names: Vec<String>,
        columns: Vec<String>,
        threshold: f64,
        watchlist_ref: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            search_id,
            task_ref,
            kind,
            query_names,
            columns,
            threshold,
            watchlist_ref,
            status: SearchStatus::Pending,
            total_rows: 0,
            execution_time_ms: None,
            matched_records: None,
            summary: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the search as picked up by the worker
    pub fn mark_processing(&mut self) {
        self.status = SearchStatus::Processing;
        self.updated_at = Utc::now();
    }

    /// Mark the search completed with its output
    pub fn mark_completed(
        &mut self,
        matched_records: MatchOutcome,
        summary: Option<SearchSummary>,
        total_rows: u64,
        elapsed_ms: u64,
    ) {
        self.status = SearchStatus::Completed;
        self.matched_records = Some(matched_records);
        self.summary = summary;
        self.total_rows = total_rows;
        self.execution_time_ms = Some(elapsed_ms);
        self.error_message = None;
        self.updated_at = Utc::now();
    }

    /// Mark the search failed with the captured error
    pub fn mark_failed(&mut self, error_message: String, elapsed_ms: u64) {
        self.status = SearchStatus::Failed;
        self.error_message = Some(error_message);
        self.execution_time_ms = Some(elapsed_ms);
        self.updated_at = Utc::now();
    }
}
