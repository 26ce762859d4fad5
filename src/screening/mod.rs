//! Fuzzy name screening

mod job;
pub mod matcher;

pub use job::{SearchHandler, SearchParams, SearchRequest};
pub use matcher::{normalize, score, search_bulk, search_single};
