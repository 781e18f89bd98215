//! Batch Documentation Merger
//!
//! Folds the entries produced by this run's batches into the existing
//! consolidated document:
//!
//! - entries for files that were not scheduled are kept verbatim
//! - new entries always win over existing ones
//! - a scheduled file with no new entry is retired
//!
//! The result is rendered sorted by basename and written both as the
//! consolidated artifact and as the baseline the next run starts from.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::document::{EntryMap, parse_document, render_document, render_entry};
use super::entry::BatchResult;
use crate::storage::SharedBackend;
use crate::types::{Result, basename};

/// What happened to each basename during a merge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStats {
    /// Existing entries carried over unchanged
    pub kept: Vec<String>,
    /// Existing entries replaced by a new entry
    pub updated: Vec<String>,
    /// New entries with no existing counterpart
    pub added: Vec<String>,
    /// Scheduled entries that produced no new documentation
    pub retired: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub entries: EntryMap,
    pub document: String,
    pub stats: MergeStats,
}

/// Merge existing blocks with batch entries.
///
/// `scheduled` holds the work-list paths; only their basenames matter.
pub fn merge_entries(
    existing: &EntryMap,
    batches: &[BatchResult],
    scheduled: &[String],
) -> (EntryMap, MergeStats) {
    let mut fresh = EntryMap::new();
    for batch in batches {
        for entry in &batch.entries {
            if fresh
                .insert(entry.key().to_string(), render_entry(entry))
                .is_some()
            {
                debug!("{} overrides an earlier entry for {}", batch.id, entry.key());
            }
        }
    }

    let scheduled: HashSet<&str> = scheduled.iter().map(|p| basename(p)).collect();
    let mut stats = MergeStats::default();
    let mut merged = EntryMap::new();

    for (key, block) in existing {
        if fresh.contains_key(key) {
            stats.updated.push(key.clone());
        } else if scheduled.contains(key.as_str()) {
            stats.retired.push(key.clone());
        } else {
            stats.kept.push(key.clone());
            merged.insert(key.clone(), block.clone());
        }
    }
    for (key, block) in fresh {
        if !existing.contains_key(&key) {
            stats.added.push(key.clone());
        }
        merged.insert(key, block);
    }

    stats.total = merged.len();
    (merged, stats)
}

/// Merges batch results into the consolidated document on a backend
pub struct DocMerger {
    backend: SharedBackend,
    docs_key: PathBuf,
    baseline_key: PathBuf,
    title: String,
}

impl DocMerger {
    pub fn new(
        backend: SharedBackend,
        docs_key: impl Into<PathBuf>,
        baseline_key: impl Into<PathBuf>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            docs_key: docs_key.into(),
            baseline_key: baseline_key.into(),
            title: title.into(),
        }
    }

    /// Existing document: the baseline if present, else the last
    /// consolidated artifact
    pub async fn load_existing(&self) -> Result<EntryMap> {
        if let Some(content) = self.backend.read(&self.baseline_key).await? {
            return Ok(parse_document(&content));
        }
        if let Some(content) = self.backend.read(&self.docs_key).await? {
            debug!("No baseline, starting from {}", self.backend.locate(&self.docs_key));
            return Ok(parse_document(&content));
        }
        Ok(EntryMap::new())
    }

    /// Compute the merge without writing anything
    pub async fn plan(
        &self,
        batches: &[BatchResult],
        scheduled: &[String],
        now: DateTime<Utc>,
    ) -> Result<MergeOutcome> {
        let existing = self.load_existing().await?;
        let (entries, stats) = merge_entries(&existing, batches, scheduled);
        let document = render_document(&self.title, &entries, now);
        Ok(MergeOutcome {
            entries,
            document,
            stats,
        })
    }

    /// Merge and write both the consolidated document and the baseline
    pub async fn merge(
        &self,
        batches: &[BatchResult],
        scheduled: &[String],
        now: DateTime<Utc>,
    ) -> Result<MergeOutcome> {
        let outcome = self.plan(batches, scheduled, now).await?;
        self.backend.write(&self.docs_key, &outcome.document).await?;
        self.backend
            .write(&self.baseline_key, &outcome.document)
            .await?;

        info!(
            "Merged {} entries ({} kept, {} updated, {} added, {} retired) into {}",
            outcome.stats.total,
            outcome.stats.kept.len(),
            outcome.stats.updated.len(),
            outcome.stats.added.len(),
            outcome.stats.retired.len(),
            self.backend.locate(&self.docs_key)
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::entry::DocumentationEntry;
    use crate::storage::{MemoryBackend, StateBackend};
    use chrono::TimeZone;
    use std::path::Path;
    use std::sync::Arc;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, hour, 0, 0).unwrap()
    }

    fn batch(id: &str, entries: &[(&str, &str)]) -> BatchResult {
        BatchResult {
            id: id.to_string(),
            entries: entries
                .iter()
                .map(|(file, md)| DocumentationEntry::new(*file, *md))
                .collect(),
        }
    }

    fn existing(keys: &[(&str, &str)]) -> EntryMap {
        keys.iter()
            .map(|(k, body)| (k.to_string(), format!("## {} → {}\n\n{}", k, k, body)))
            .collect()
    }

    fn merger(backend: Arc<MemoryBackend>) -> DocMerger {
        DocMerger::new(backend, "docs.md", "existing.md", "Docs")
    }

    #[test]
    fn test_unscheduled_existing_entries_are_kept() {
        let old = existing(&[("a.spec.js", "old a"), ("b.spec.js", "old b")]);
        let batches = [batch("batch-1", &[("tests/b.spec.js", "new b")])];
        let scheduled = vec!["tests/b.spec.js".to_string()];

        let (merged, stats) = merge_entries(&old, &batches, &scheduled);

        assert_eq!(merged["a.spec.js"], old["a.spec.js"]);
        assert!(merged["b.spec.js"].ends_with("new b"));
        assert_eq!(stats.kept, vec!["a.spec.js"]);
        assert_eq!(stats.updated, vec!["b.spec.js"]);
        assert_eq!(stats.total, 2);
    }

    #[test]
    fn test_scheduled_without_entry_is_retired() {
        let old = existing(&[("a.spec.js", "a"), ("gone.spec.js", "g")]);
        let scheduled = vec!["tests/gone.spec.js".to_string()];

        let (merged, stats) = merge_entries(&old, &[], &scheduled);

        assert!(!merged.contains_key("gone.spec.js"));
        assert_eq!(stats.retired, vec!["gone.spec.js"]);
        assert_eq!(stats.kept, vec!["a.spec.js"]);
    }

    #[test]
    fn test_later_batch_wins() {
        let batches = [
            batch("batch-1", &[("x/a.spec.js", "first")]),
            batch("batch-2", &[("y/a.spec.js", "second")]),
        ];
        let (merged, stats) = merge_entries(&EntryMap::new(), &batches, &[]);
        assert!(merged["a.spec.js"].ends_with("second"));
        assert_eq!(stats.added, vec!["a.spec.js"]);
    }

    #[test]
    fn test_new_entry_wins_even_when_unscheduled() {
        let old = existing(&[("a.spec.js", "old")]);
        let batches = [batch("batch-1", &[("a.spec.js", "new")])];
        let (merged, stats) = merge_entries(&old, &batches, &[]);
        assert!(merged["a.spec.js"].ends_with("new"));
        assert_eq!(stats.updated, vec!["a.spec.js"]);
    }

    #[tokio::test]
    async fn test_merge_writes_document_and_baseline() {
        let backend = MemoryBackend::shared();
        let merger = merger(backend.clone());
        let batches = [
            batch("batch-1", &[("tests/c.spec.js", "cee")]),
            batch("batch-2", &[("tests/a.spec.js", "ay")]),
        ];

        let outcome = merger.merge(&batches, &[], at(0)).await.unwrap();
        assert_eq!(outcome.stats.added, vec!["a.spec.js", "c.spec.js"]);

        let docs = backend.read(Path::new("docs.md")).await.unwrap().unwrap();
        let baseline = backend.read(Path::new("existing.md")).await.unwrap().unwrap();
        assert_eq!(docs, baseline);
        assert!(docs.find("a.spec.js →").unwrap() < docs.find("c.spec.js →").unwrap());
    }

    #[tokio::test]
    async fn test_remerge_without_changes_is_stable() {
        let backend = MemoryBackend::shared();
        let merger = merger(backend.clone());
        let batches = [batch(
            "batch-1",
            &[
                ("a.spec.js", "ay"),
                ("b.spec.js", "bee"),
                ("tests/user profile.spec.js", "profile"),
            ],
        )];

        let first = merger.merge(&batches, &[], at(0)).await.unwrap();
        let second = merger.merge(&[], &[], at(0)).await.unwrap();

        assert_eq!(first.document, second.document);
        assert_eq!(
            second.stats.kept,
            vec!["a.spec.js", "b.spec.js", "user profile.spec.js"]
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_consolidated_document() {
        let backend = MemoryBackend::shared();
        let merger = merger(backend.clone());
        merger
            .merge(&[batch("batch-1", &[("a.spec.js", "ay")])], &[], at(0))
            .await
            .unwrap();
        backend.remove(Path::new("existing.md")).await.unwrap();

        let existing = merger.load_existing().await.unwrap();
        assert!(existing.contains_key("a.spec.js"));
    }

    #[tokio::test]
    async fn test_plan_does_not_write() {
        let backend = MemoryBackend::shared();
        let merger = merger(backend.clone());
        merger
            .plan(&[batch("batch-1", &[("a.spec.js", "ay")])], &[], at(0))
            .await
            .unwrap();
        assert!(backend.is_empty());
    }
}
