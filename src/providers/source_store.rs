//! Source artifact storage trait

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Store of uploaded source artifacts (raw CSV bytes)
///
/// Implementations:
/// - `LocalSourceStore`: local filesystem
/// - `MemorySourceStore`: in-memory, for tests and development
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Fetch the bytes of a source artifact
    ///
    /// Returns `Error::SourceNotFound` when the reference does not resolve.
    async fn fetch_bytes(&self, source_ref: &str) -> Result<Bytes>;

    /// Delete a source artifact
    async fn delete(&self, source_ref: &str) -> Result<()>;
}
