//! Documentation entries and batch result files
//!
//! A batch result file is written by one external AI worker and holds the
//! entries it produced, either as `{ "entries": [...] }` or as a bare array.
//! Entries are keyed by file basename, the join key across batches.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{Result, basename, natural_key};

/// One documented test file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationEntry {
    #[serde(alias = "file", alias = "file_name")]
    pub file_name: String,
    #[serde(default, alias = "content", alias = "documentation")]
    pub markdown: String,
    #[serde(default, alias = "test_name", skip_serializing_if = "Option::is_none")]
    pub test_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<String>,
    #[serde(default, alias = "ui_elements", skip_serializing_if = "Vec::is_empty")]
    pub ui_elements: Vec<String>,
    /// Any other structured fields, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl DocumentationEntry {
    pub fn new(file_name: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            markdown: markdown.into(),
            test_name: None,
            tags: Vec::new(),
            endpoints: Vec::new(),
            ui_elements: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_test_name(mut self, name: impl Into<String>) -> Self {
        self.test_name = Some(name.into());
        self
    }

    /// Join key: the basename of `file_name`
    pub fn key(&self) -> &str {
        basename(&self.file_name)
    }
}

/// Entries produced by one batch
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Batch identifier (file stem)
    pub id: String,
    pub entries: Vec<DocumentationEntry>,
}

impl BatchResult {
    /// Parse a batch document. Malformed content yields an empty batch.
    pub fn parse(id: impl Into<String>, content: &str) -> Self {
        let id = id.into();
        let entries = match serde_json::from_str::<Value>(content) {
            Ok(value) => entries_from_value(&id, value),
            Err(e) => {
                warn!("Malformed batch result {} ({}), treating as empty", id, e);
                Vec::new()
            }
        };
        Self { id, entries }
    }

    /// A batch is working iff it produced at least one entry
    pub fn is_working(&self) -> bool {
        !self.entries.is_empty()
    }
}

fn entries_from_value(id: &str, value: Value) -> Vec<DocumentationEntry> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("entries") {
            Some(Value::Array(items)) => items,
            _ => {
                warn!("Batch result {} has no entries array", id);
                return Vec::new();
            }
        },
        _ => {
            warn!("Batch result {} is neither an object nor an array", id);
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(
            |(i, item)| match serde_json::from_value::<DocumentationEntry>(item) {
                Ok(entry) if !entry.file_name.trim().is_empty() => Some(entry),
                Ok(_) => {
                    warn!("Batch {} entry {} has an empty fileName, skipping", id, i);
                    None
                }
                Err(e) => {
                    warn!("Batch {} entry {} is invalid ({}), skipping", id, i, e);
                    None
                }
            },
        )
        .collect()
}

/// Read every batch file in `dir` whose name matches `pattern`, in natural
/// order (`batch-2` before `batch-10`). A missing directory is no batches.
pub async fn load_batches(dir: &Path, pattern: &str) -> Result<Vec<BatchResult>> {
    let pattern = glob::Pattern::new(pattern)?;

    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No batch directory at {}", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut files: Vec<(String, PathBuf)> = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            continue;
        };
        if entry.file_type().await?.is_file() && pattern.matches(&name) {
            files.push((name, path));
        }
    }
    files.sort_by_key(|(name, _)| natural_key(name));

    let mut batches = Vec::with_capacity(files.len());
    for (name, path) in files {
        let id = name.split('.').next().unwrap_or(&name).to_string();
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => batches.push(BatchResult::parse(id, &content)),
            Err(e) => {
                warn!("Unreadable batch result {} ({}), treating as empty", name, e);
                batches.push(BatchResult {
                    id,
                    entries: Vec::new(),
                });
            }
        }
    }

    debug!("Loaded {} batch results from {}", batches.len(), dir.display());
    Ok(batches)
}
