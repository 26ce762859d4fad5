//! namescreen: background-processing core for tabular-data ingestion and
//! fuzzy name screening
//!
//! The crate provides the asynchronous engine behind a name-screening
//! application: job queues with one worker loop per kind, a CSV-to-store
//! ingestion pipeline, a fuzzy matcher that screens query names against
//! ingested rows, a retry-capable notification dispatcher, and startup
//! recovery of interrupted work. HTTP routing, authentication and profile
//! CRUD live in the surrounding application and talk to this core through
//! `ScreeningEngine` and the provider traits.

pub mod config;
pub mod engine;
pub mod error;
pub mod ingestion;
pub mod notification;
pub mod processing;
pub mod providers;
pub mod screening;
pub mod status;
pub mod storage;
pub mod types;

pub use config::EngineConfig;
pub use engine::{Collaborators, ScreeningEngine};
pub use error::{Error, Result};
pub use screening::{SearchParams, SearchRequest};
pub use status::StatusTracker;
pub use storage::ScreeningDb;
pub use types::{
    BulkQueryResult, DatasetRow, MatchOutcome, MatchedRecord, NotificationPriority,
    NotificationRecord, NotificationStatus, SearchKind, SearchRecord, SearchStatus, SearchSummary,
    TaskRecord, TaskStatus,
};
