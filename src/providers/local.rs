//! Local source store implementations

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::source_store::SourceStore;
use super::transport::{EmailMessage, Transport};

/// Filesystem-backed source store; a `source_ref` is a file name under the
/// store's root directory.
pub struct LocalSourceStore {
    root: PathBuf,
}

impl LocalSourceStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, source_ref: &str) -> Result<PathBuf> {
        // Refs are bare file names; reject anything that walks the tree.
        let name = Path::new(source_ref);
        if name.components().count() != 1 {
            return Err(Error::Internal(format!(
                "invalid source ref: {}",
                source_ref
            )));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl SourceStore for LocalSourceStore {
    async fn fetch_bytes(&self, source_ref: &str) -> Result<Bytes> {
        let path = self.resolve(source_ref)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::SourceNotFound(source_ref.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, source_ref: &str) -> Result<()> {
        let path = self.resolve(source_ref)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory source store for tests and development
#[derive(Default)]
pub struct MemorySourceStore {
    entries: DashMap<String, Bytes>,
}

impl MemorySourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a source artifact
    pub fn put(&self, source_ref: &str, data: impl Into<Bytes>) {
        self.entries.insert(source_ref.to_string(), data.into());
    }

    /// Whether the artifact is still present
    pub fn contains(&self, source_ref: &str) -> bool {
        self.entries.contains_key(source_ref)
    }
}

#[async_trait]
impl SourceStore for MemorySourceStore {
    async fn fetch_bytes(&self, source_ref: &str) -> Result<Bytes> {
        self.entries
            .get(source_ref)
            .map(|e| e.value().clone())
            .ok_or_else(|| Error::SourceNotFound(source_ref.to_string()))
    }

    async fn delete(&self, source_ref: &str) -> Result<()> {
        self.entries.remove(source_ref);
        Ok(())
    }
}

/// Transport that logs deliveries instead of sending them (development)
pub struct LogTransport;

#[async_trait]
impl Transport for LogTransport {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        tracing::info!(
            recipients = ?message.recipients,
            subject = %message.subject,
            "delivery suppressed, log transport"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
