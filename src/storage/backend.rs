//! State Backends
//!
//! Every piece of shared state (metadata store, lease tables, work lists,
//! reports) is a whole document addressed by a relative key. Backends only
//! read, overwrite and delete whole documents; there is no partial update
//! and no cross-process transaction.
//!
//! - [`FileBackend`]: documents are files under a root directory
//! - [`MemoryBackend`]: documents live in a concurrent map (tests, dry runs)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::types::{Result, ResultExt};

/// Whole-document key/value persistence
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Read a document. A missing document is `Ok(None)`.
    async fn read(&self, key: &Path) -> Result<Option<String>>;

    /// Overwrite a document, creating it if needed
    async fn write(&self, key: &Path, contents: &str) -> Result<()>;

    /// Delete a document. Returns whether it existed.
    async fn remove(&self, key: &Path) -> Result<bool>;

    /// Human-readable location of a key for log messages
    fn locate(&self, key: &Path) -> String;
}

pub type SharedBackend = Arc<dyn StateBackend>;

// =============================================================================
// File Backend
// =============================================================================

/// Documents stored as files under `root`
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn shared(root: impl Into<PathBuf>) -> SharedBackend {
        Arc::new(Self::new(root))
    }

    fn path(&self, key: &Path) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl StateBackend for FileBackend {
    async fn read(&self, key: &Path) -> Result<Option<String>> {
        let path = self.path(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &Path, contents: &str) -> Result<()> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context_fn(|| format!("creating {}", parent.display()))?;
        }
        tokio::fs::write(&path, contents).await?;
        debug!("Wrote {} ({} bytes)", path.display(), contents.len());
        Ok(())
    }

    async fn remove(&self, key: &Path) -> Result<bool> {
        match tokio::fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn locate(&self, key: &Path) -> String {
        self.path(key).display().to_string()
    }
}

// =============================================================================
// Memory Backend
// =============================================================================

/// Documents stored in memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    documents: DashMap<PathBuf, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl StateBackend for MemoryBackend {
    async fn read(&self, key: &Path) -> Result<Option<String>> {
        Ok(self.documents.get(key).map(|doc| doc.value().clone()))
    }

    async fn write(&self, key: &Path, contents: &str) -> Result<()> {
        self.documents.insert(key.to_path_buf(), contents.to_string());
        Ok(())
    }

    async fn remove(&self, key: &Path) -> Result<bool> {
        Ok(self.documents.remove(key).is_some())
    }

    fn locate(&self, key: &Path) -> String {
        format!("memory:{}", key.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_backend_roundtrip() {
        let temp = TempDir::new().unwrap();
        let backend = FileBackend::new(temp.path());
        let key = Path::new("leases/models.json");

        assert!(backend.read(key).await.unwrap().is_none());

        backend.write(key, "{}").await.unwrap();
        assert!(temp.path().join("leases/models.json").exists());
        assert_eq!(backend.read(key).await.unwrap().as_deref(), Some("{}"));

        assert!(backend.remove(key).await.unwrap());
        assert!(!backend.remove(key).await.unwrap());
        assert!(backend.read(key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_backend_overwrites_whole_document() {
        let temp = TempDir::new().unwrap();
        let backend = FileBackend::new(temp.path());
        let key = Path::new("metadata.json");

        backend.write(key, "a much longer first document").await.unwrap();
        backend.write(key, "short").await.unwrap();
        assert_eq!(backend.read(key).await.unwrap().as_deref(), Some("short"));
    }

    #[tokio::test]
    async fn test_memory_backend() {
        let backend = MemoryBackend::new();
        let key = Path::new("work-list.txt");

        assert!(backend.read(key).await.unwrap().is_none());
        backend.write(key, "a.spec.js\n").await.unwrap();
        assert_eq!(backend.len(), 1);
        assert_eq!(
            backend.read(key).await.unwrap().as_deref(),
            Some("a.spec.js\n")
        );
        assert!(backend.remove(key).await.unwrap());
        assert!(backend.is_empty());
        assert_eq!(backend.locate(key), "memory:work-list.txt");
    }
}
