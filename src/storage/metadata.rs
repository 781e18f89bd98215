//! Metadata Store
//!
//! Persisted mapping from test file path to the fingerprint it had when it
//! was last documented. Loaded and saved as one document per invocation;
//! there is no incremental locking, so only one writer may run per pipeline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::backend::SharedBackend;
use crate::types::Result;

/// Stored state of one processed file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Content fingerprint (hex SHA-256)
    pub hash: String,
    /// Modification time in milliseconds since the epoch
    pub timestamp: f64,
    /// When the file was last processed (RFC 3339)
    pub last_processed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<String>,
}

impl FileRecord {
    pub fn new(
        hash: impl Into<String>,
        modified_ms: i64,
        processed_at: DateTime<Utc>,
        provenance: Option<String>,
    ) -> Self {
        Self {
            hash: hash.into(),
            timestamp: modified_ms as f64,
            last_processed: processed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            provenance,
        }
    }
}

/// Path → record, ordered for stable output
pub type MetadataMap = BTreeMap<String, FileRecord>;

/// Whole-document metadata persistence over a [`StateBackend`](super::StateBackend)
pub struct MetadataStore {
    backend: SharedBackend,
    key: PathBuf,
}

impl MetadataStore {
    pub fn new(backend: SharedBackend, key: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &Path {
        &self.key
    }

    /// Load all records.
    ///
    /// A missing document is an empty map. Malformed content is logged and
    /// also treated as empty so a corrupted store only costs a full rerun.
    pub async fn load(&self) -> Result<MetadataMap> {
        let content = match self.backend.read(&self.key).await {
            Ok(Some(content)) => content,
            Ok(None) => {
                debug!(
                    "No metadata at {}, starting empty",
                    self.backend.locate(&self.key)
                );
                return Ok(MetadataMap::new());
            }
            Err(e) => {
                warn!(
                    "Unreadable metadata at {} ({}), starting empty",
                    self.backend.locate(&self.key),
                    e
                );
                return Ok(MetadataMap::new());
            }
        };

        if content.trim().is_empty() {
            return Ok(MetadataMap::new());
        }

        match serde_json::from_str::<MetadataMap>(&content) {
            Ok(map) => {
                debug!("Loaded {} metadata records", map.len());
                Ok(map)
            }
            Err(e) => {
                warn!(
                    "Malformed metadata at {} ({}), starting empty",
                    self.backend.locate(&self.key),
                    e
                );
                Ok(MetadataMap::new())
            }
        }
    }

    /// Overwrite the whole store
    pub async fn save(&self, records: &MetadataMap) -> Result<()> {
        let content = serde_json::to_string_pretty(records)?;
        self.backend.write(&self.key, &content).await?;
        debug!(
            "Saved {} metadata records to {}",
            records.len(),
            self.backend.locate(&self.key)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileBackend, MemoryBackend, StateBackend};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn store() -> (Arc<MemoryBackend>, MetadataStore) {
        let backend = MemoryBackend::shared();
        let store = MetadataStore::new(backend.clone(), "metadata.json");
        (backend, store)
    }

    #[tokio::test]
    async fn test_missing_store_is_empty() {
        let (_, store) = store();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_store_is_empty() {
        let (backend, store) = store();
        backend
            .write(Path::new("metadata.json"), "{ not json")
            .await
            .unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_store_is_empty() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = MetadataStore::new(FileBackend::shared(temp.path()), "metadata.json");

        std::fs::write(temp.path().join("metadata.json"), [0xff, 0xfe, 0x00, b'{']).unwrap();
        assert!(store.load().await.unwrap().is_empty());

        std::fs::remove_file(temp.path().join("metadata.json")).unwrap();
        std::fs::create_dir(temp.path().join("metadata.json")).unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (_, store) = store();
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let mut records = MetadataMap::new();
        records.insert(
            "tests/a.spec.js".to_string(),
            FileRecord::new("abc", 1_700_000_000_000, at, Some("ai-docs".to_string())),
        );

        store.save(&records).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, records);
        assert_eq!(
            loaded["tests/a.spec.js"].last_processed,
            "2026-01-02T03:04:05.000Z"
        );
    }

    #[tokio::test]
    async fn test_reads_camel_case_records() {
        let (backend, store) = store();
        backend
            .write(
                Path::new("metadata.json"),
                r#"{"a.spec.js":{"hash":"h1","timestamp":1712.5,"lastProcessed":"2024-01-01T00:00:00.000Z"}}"#,
            )
            .await
            .unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded["a.spec.js"].hash, "h1");
        assert_eq!(loaded["a.spec.js"].timestamp, 1712.5);
        assert!(loaded["a.spec.js"].provenance.is_none());
    }
}
