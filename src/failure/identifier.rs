//! Failure Identifier
//!
//! After all batches finish, reconciles the scheduled files against what the
//! batches actually documented. A scheduled file whose basename appears in
//! no batch entry failed, whichever batch was meant to handle it.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::detect::DetectionMode;
use crate::docs::BatchResult;
use crate::storage::SharedBackend;
use crate::types::{Result, basename, render_lines};

/// Health of one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchHealth {
    pub id: String,
    pub entries: usize,
    /// Produced at least one entry
    pub working: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReport {
    pub mode: DetectionMode,
    pub total_tests: usize,
    pub documented: usize,
    pub failed: usize,
    pub working_batches: usize,
    pub needs_retry: bool,
    /// Scheduled paths (as scheduled) with no documentation entry
    pub failed_files: Vec<String>,
    pub batches: Vec<BatchHealth>,
}

/// Compute the failure report for `scheduled` against `batches`
pub fn identify_failures(
    mode: DetectionMode,
    scheduled: &[String],
    batches: &[BatchResult],
) -> FailureReport {
    let documented: HashSet<&str> = batches
        .iter()
        .flat_map(|b| b.entries.iter().map(|e| e.key()))
        .collect();

    let failed_files: Vec<String> = scheduled
        .iter()
        .filter(|path| !documented.contains(basename(path)))
        .cloned()
        .collect();

    let batches: Vec<BatchHealth> = batches
        .iter()
        .map(|b| BatchHealth {
            id: b.id.clone(),
            entries: b.entries.len(),
            working: b.is_working(),
        })
        .collect();

    FailureReport {
        mode,
        total_tests: scheduled.len(),
        documented: scheduled.len() - failed_files.len(),
        failed: failed_files.len(),
        working_batches: batches.iter().filter(|b| b.working).count(),
        needs_retry: !failed_files.is_empty(),
        failed_files,
        batches,
    }
}

/// Persists failure reports for the retry step
pub struct FailureIdentifier {
    backend: SharedBackend,
    report_key: PathBuf,
    failed_list_key: PathBuf,
}

impl FailureIdentifier {
    pub fn new(
        backend: SharedBackend,
        report_key: impl Into<PathBuf>,
        failed_list_key: impl Into<PathBuf>,
    ) -> Self {
        Self {
            backend,
            report_key: report_key.into(),
            failed_list_key: failed_list_key.into(),
        }
    }

    /// Identify failures and write the JSON report plus the failed list
    pub async fn run(
        &self,
        mode: DetectionMode,
        scheduled: &[String],
        batches: &[BatchResult],
    ) -> Result<FailureReport> {
        let report = identify_failures(mode, scheduled, batches);

        self.backend
            .write(&self.report_key, &serde_json::to_string_pretty(&report)?)
            .await?;
        self.backend
            .write(&self.failed_list_key, &render_lines(&report.failed_files))
            .await?;

        if report.needs_retry {
            warn!(
                "{} of {} scheduled tests produced no documentation",
                report.failed, report.total_tests
            );
        }
        info!(
            "{} documented, {} failed, {}/{} batches working ({} mode)",
            report.documented,
            report.failed,
            report.working_batches,
            report.batches.len(),
            report.mode
        );
        Ok(report)
    }

    /// Remove the report and failed list of a previous run.
    ///
    /// Returns whether anything was removed.
    pub async fn clear(&self) -> Result<bool> {
        let report = self.backend.remove(&self.report_key).await?;
        let failed = self.backend.remove(&self.failed_list_key).await?;
        if report || failed {
            debug!("Cleared failure state of the previous run");
        }
        Ok(report || failed)
    }

    /// Failed paths from the last run; empty if none were recorded
    pub async fn load_failed(&self) -> Result<Vec<String>> {
        Ok(self
            .backend
            .read(&self.failed_list_key)
            .await?
            .map(|content| crate::types::parse_lines(&content))
            .unwrap_or_default())
    }

    /// Last persisted report, if readable
    pub async fn load_report(&self) -> Option<FailureReport> {
        let content = self.backend.read(&self.report_key).await.ok()??;
        serde_json::from_str(&content)
            .map_err(|e| warn!("Ignoring malformed failure report: {}", e))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::DocumentationEntry;
    use crate::storage::{MemoryBackend, StateBackend};
    use std::path::Path;

    fn batch(id: &str, files: &[&str]) -> BatchResult {
        BatchResult {
            id: id.to_string(),
            entries: files
                .iter()
                .map(|f| DocumentationEntry::new(*f, "doc"))
                .collect(),
        }
    }

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_failures_are_scheduled_minus_documented() {
        let scheduled = paths(&[
            "tests/auth/login.spec.js",
            "tests/shop/cart.spec.js",
            "tests/shop/pay.spec.js",
        ]);
        let batches = [
            batch("batch-1", &["login.spec.js"]),
            batch("batch-2", &[]),
            batch("batch-3", &["other/cart.spec.js", "unscheduled.spec.js"]),
        ];

        let report = identify_failures(DetectionMode::Incremental, &scheduled, &batches);

        assert_eq!(report.failed_files, vec!["tests/shop/pay.spec.js"]);
        assert_eq!(report.total_tests, 3);
        assert_eq!(report.documented, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.working_batches, 2);
        assert!(report.needs_retry);
        assert!(!report.batches[1].working);
    }

    #[test]
    fn test_no_batches_everything_failed() {
        let scheduled = paths(&["a.spec.js", "b.spec.js"]);
        let report = identify_failures(DetectionMode::Full, &scheduled, &[]);
        assert_eq!(report.failed_files, scheduled);
        assert_eq!(report.working_batches, 0);
    }

    #[test]
    fn test_nothing_scheduled() {
        let report =
            identify_failures(DetectionMode::Incremental, &[], &[batch("batch-1", &["a.js"])]);
        assert!(!report.needs_retry);
        assert_eq!(report.documented, 0);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = identify_failures(DetectionMode::Full, &paths(&["a.spec.js"]), &[]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "full");
        assert_eq!(json["totalTests"], 1);
        assert_eq!(json["needsRetry"], true);
        assert_eq!(json["failedFiles"][0], "a.spec.js");
    }

    #[tokio::test]
    async fn test_run_persists_report_and_list() {
        let backend = MemoryBackend::shared();
        let identifier = FailureIdentifier::new(backend.clone(), "failures.json", "failed.txt");
        let scheduled = paths(&["tests/a.spec.js", "tests/b.spec.js"]);

        identifier
            .run(
                DetectionMode::Incremental,
                &scheduled,
                &[batch("batch-1", &["b.spec.js"])],
            )
            .await
            .unwrap();

        let list = backend.read(Path::new("failed.txt")).await.unwrap().unwrap();
        assert_eq!(list, "tests/a.spec.js\n");
        assert_eq!(identifier.load_failed().await.unwrap(), vec!["tests/a.spec.js"]);

        let report = identifier.load_report().await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.batches[0].id, "batch-1");
    }

    #[tokio::test]
    async fn test_load_failed_without_report() {
        let identifier =
            FailureIdentifier::new(MemoryBackend::shared(), "failures.json", "failed.txt");
        assert!(identifier.load_failed().await.unwrap().is_empty());
        assert!(identifier.load_report().await.is_none());
    }
}
