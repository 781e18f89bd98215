//! Change Detector
//!
//! Classifies each discovered test file as new, changed or unchanged by
//! comparing its current content fingerprint against the metadata store.
//! Modification times are recorded but never decide a classification: a
//! touched-but-identical file stays unchanged.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::fingerprint::snapshot_file;
use crate::storage::MetadataStore;
use crate::types::Result;

/// Classification of one candidate file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    New,
    Changed,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    /// Compare against stored fingerprints
    Incremental,
    /// Every discovered file is scheduled; the store is not consulted
    Full,
}

impl std::fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Incremental => write!(f, "incremental"),
            Self::Full => write!(f, "full"),
        }
    }
}

/// Outcome of one detection run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    pub mode: DetectionMode,
    pub total: usize,
    pub new: Vec<String>,
    pub changed: Vec<String>,
    pub unchanged: Vec<String>,
    /// Candidates that could not be read
    pub skipped: Vec<String>,
    /// Files to (re)process, in sorted discovery order
    pub work_list: Vec<String>,
}

impl DetectionReport {
    fn empty(mode: DetectionMode, total: usize) -> Self {
        Self {
            mode,
            total,
            new: Vec::new(),
            changed: Vec::new(),
            unchanged: Vec::new(),
            skipped: Vec::new(),
            work_list: Vec::new(),
        }
    }

    pub fn has_work(&self) -> bool {
        !self.work_list.is_empty()
    }
}

pub struct ChangeDetector<'a> {
    root: PathBuf,
    store: &'a MetadataStore,
}

impl<'a> ChangeDetector<'a> {
    /// `root` is the directory candidate paths are relative to
    pub fn new(root: impl Into<PathBuf>, store: &'a MetadataStore) -> Self {
        Self {
            root: root.into(),
            store,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Classify candidates against the stored fingerprints
    pub async fn detect(&self, candidates: &[String]) -> Result<DetectionReport> {
        let candidates = sorted(candidates);
        let records = self.store.load().await?;
        let mut report = DetectionReport::empty(DetectionMode::Incremental, candidates.len());

        for path in candidates {
            let snapshot = match snapshot_file(&self.root.join(&path)).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("Skipping {}: {}", path, e);
                    report.skipped.push(path);
                    continue;
                }
            };

            let kind = match records.get(&path) {
                None => ChangeKind::New,
                Some(record) if snapshot.fingerprint.as_str() != record.hash => ChangeKind::Changed,
                Some(_) => ChangeKind::Unchanged,
            };
            debug!("{} -> {:?}", path, kind);

            match kind {
                ChangeKind::New => {
                    report.new.push(path.clone());
                    report.work_list.push(path);
                }
                ChangeKind::Changed => {
                    report.changed.push(path.clone());
                    report.work_list.push(path);
                }
                ChangeKind::Unchanged => report.unchanged.push(path),
            }
        }

        info!(
            "Detected {} new, {} changed, {} unchanged, {} skipped",
            report.new.len(),
            report.changed.len(),
            report.unchanged.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Schedule every candidate without reading or touching the store
    pub fn detect_forced(candidates: &[String]) -> DetectionReport {
        let candidates = sorted(candidates);
        let mut report = DetectionReport::empty(DetectionMode::Full, candidates.len());
        report.work_list = candidates;
        info!(
            "Forced full run: {} files scheduled",
            report.work_list.len()
        );
        report
    }
}

fn sorted(candidates: &[String]) -> Vec<String> {
    let mut sorted = candidates.to_vec();
    sorted.sort();
    sorted.dedup();
    sorted
}
