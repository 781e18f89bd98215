//! Metadata Update step
//!
//! Records the current fingerprint of files that were processed
//! successfully. Runs once per pipeline, after every batch has finished;
//! it is the only writer of the metadata store besides `detect --sync`.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::fingerprint::snapshot_file;
use crate::storage::{FileRecord, MetadataStore};
use crate::types::Result;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutcome {
    pub recorded: Vec<String>,
    /// Scheduled files that no longer exist
    pub missing: Vec<String>,
    /// Scheduled files left unrecorded because processing failed
    pub excluded: Vec<String>,
}

/// Fingerprint `paths` (relative to `root`) and store their records
pub async fn record_processed(
    root: &Path,
    store: &MetadataStore,
    paths: &[String],
    provenance: Option<&str>,
    now: DateTime<Utc>,
) -> Result<RecordOutcome> {
    record_processed_except(root, store, paths, &[], provenance, now).await
}

/// Like [`record_processed`], skipping any path listed in `failed`.
///
/// Failed files keep their previous record (or stay absent) so the next
/// detection schedules them again.
pub async fn record_processed_except(
    root: &Path,
    store: &MetadataStore,
    paths: &[String],
    failed: &[String],
    provenance: Option<&str>,
    now: DateTime<Utc>,
) -> Result<RecordOutcome> {
    let failed: HashSet<&str> = failed.iter().map(String::as_str).collect();
    let mut records = store.load().await?;
    let mut outcome = RecordOutcome::default();

    for path in paths {
        if failed.contains(path.as_str()) {
            outcome.excluded.push(path.clone());
            continue;
        }

        match snapshot_file(&root.join(path)).await {
            Ok(snapshot) => {
                records.insert(
                    path.clone(),
                    FileRecord::new(
                        snapshot.fingerprint.into_inner(),
                        snapshot.modified_ms,
                        now,
                        provenance.map(String::from),
                    ),
                );
                outcome.recorded.push(path.clone());
            }
            Err(e) => {
                warn!("Not recording {}: {}", path, e);
                outcome.missing.push(path.clone());
            }
        }
    }

    if !outcome.recorded.is_empty() {
        store.save(&records).await?;
    }

    info!(
        "Recorded {} files ({} failed, {} missing)",
        outcome.recorded.len(),
        outcome.excluded.len(),
        outcome.missing.len()
    );
    Ok(outcome)
}
