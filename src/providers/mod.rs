//! Collaborator abstractions the screening core consumes
//!
//! The surrounding application supplies implementations of these traits;
//! the crate ships a SQLite-backed record/dataset store (`crate::storage`)
//! and local source stores for development and tests.

pub mod dataset_store;
pub mod local;
pub mod record_store;
pub mod source_store;
pub mod transport;

pub use dataset_store::DatasetStore;
pub use local::{LocalSourceStore, LogTransport, MemorySourceStore};
pub use record_store::{NotificationStore, SearchStore, TaskStore};
pub use source_store::SourceStore;
pub use transport::{EmailMessage, Transport};
