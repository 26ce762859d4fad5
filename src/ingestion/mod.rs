//! CSV source ingestion

pub mod delimiter;
mod loader;
mod source_cache;

pub use loader::{IngestionHandler, IngestionRequest};
pub use source_cache::SourceCache;
