//! Newline-separated path lists shared between pipeline steps
//! (work list, failed list).

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::storage::SharedBackend;
use crate::types::{Result, parse_lines, render_lines};

/// A persisted list of test file paths
pub struct PathList {
    backend: SharedBackend,
    key: PathBuf,
}

impl PathList {
    pub fn new(backend: SharedBackend, key: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &Path {
        &self.key
    }

    /// `None` when the list has never been written, which callers treat
    /// differently from an empty list.
    pub async fn load(&self) -> Result<Option<Vec<String>>> {
        let content = self.backend.read(&self.key).await?;
        Ok(content.map(|c| parse_lines(&c)))
    }

    /// Read the list, treating absence as empty
    pub async fn load_or_empty(&self) -> Result<Vec<String>> {
        Ok(self.load().await?.unwrap_or_default())
    }

    pub async fn save<S: AsRef<str> + Sync>(&self, paths: &[S]) -> Result<()> {
        self.backend.write(&self.key, &render_lines(paths)).await?;
        debug!(
            "Wrote {} paths to {}",
            paths.len(),
            self.backend.locate(&self.key)
        );
        Ok(())
    }

    pub fn locate(&self) -> String {
        self.backend.locate(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;

    #[tokio::test]
    async fn test_absent_vs_empty() {
        let list = PathList::new(MemoryBackend::shared(), "work-list.txt");
        assert!(list.load().await.unwrap().is_none());

        list.save::<String>(&[]).await.unwrap();
        assert_eq!(list.load().await.unwrap(), Some(vec![]));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let list = PathList::new(MemoryBackend::shared(), "work-list.txt");
        list.save(&["tests/a.spec.js", "tests/b.spec.js"])
            .await
            .unwrap();
        assert_eq!(
            list.load_or_empty().await.unwrap(),
            vec!["tests/a.spec.js", "tests/b.spec.js"]
        );
    }
}
