//! Core record types for the screening system

pub mod dataset;
pub mod notification;
pub mod search;
pub mod task;

pub use dataset::DatasetRow;
pub use notification::{NotificationPriority, NotificationRecord, NotificationStatus};
pub use search::{
    BulkQueryResult, MatchOutcome, MatchedRecord, SearchKind, SearchRecord, SearchStatus,
    SearchSummary,
};
pub use task::{TaskRecord, TaskStatus};
