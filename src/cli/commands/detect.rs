//! Detect Command
//!
//! Discover test files, classify them against the metadata store and write
//! the work list for the documentation batches.

use chrono::Utc;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, emit};
use crate::detect::{ChangeDetector, DetectionReport, record_processed};
use crate::types::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct DetectOptions {
    /// Schedule every discovered file; the store is not consulted
    pub force: bool,
    /// Record fingerprints for the work list right away
    pub sync: bool,
    /// Print the report as JSON instead of a summary
    pub json: bool,
}

/// Detect changes and persist the work list
pub async fn detect(ctx: &CommandContext, options: DetectOptions) -> Result<DetectionReport> {
    let scanner = ctx.scanner()?;
    let candidates = scanner.discover()?;
    let store = ctx.metadata_store();

    let report = if options.force {
        ChangeDetector::detect_forced(&candidates)
    } else {
        ChangeDetector::new(scanner.root(), &store)
            .detect(&candidates)
            .await?
    };

    ctx.work_list().save(&report.work_list).await?;
    // Failures belong to the previous work list
    ctx.failure_identifier().clear().await?;

    if options.sync && !options.force && report.has_work() {
        record_processed(
            scanner.root(),
            &store,
            &report.work_list,
            ctx.config.docs.provenance.as_deref(),
            Utc::now(),
        )
        .await?;
    }

    Ok(report)
}

pub async fn run(options: DetectOptions) -> Result<()> {
    let ctx = CommandContext::load()?;
    let report = detect(&ctx, options).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let out = Output::new();
    out.section(&format!("Change detection ({})", report.mode));
    out.row("Discovered", report.total);
    out.row("New", report.new.len());
    out.row("Changed", report.changed.len());
    out.row("Unchanged", report.unchanged.len());
    if !report.skipped.is_empty() {
        out.row("Skipped", report.skipped.len());
        for path in &report.skipped {
            out.item(path);
        }
    }
    out.row("Work list", ctx.work_list().locate());
    if options.sync && !options.force {
        out.success("Recorded fingerprints for the work list");
    }

    emit("tests_to_process", report.work_list.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> CommandContext {
        let mut config = Config::default();
        config.discovery.root = temp.path().to_path_buf();
        config.state.dir = temp.path().join(".testscribe");
        CommandContext::with_config(config.clone(), config.state.dir.clone())
    }

    fn write(temp: &TempDir, path: &str, content: &str) {
        let full = temp.path().join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }

    #[tokio::test]
    async fn test_detect_writes_work_list() {
        let temp = TempDir::new().unwrap();
        write(&temp, "tests/a.spec.js", "a");
        write(&temp, "tests/b.spec.ts", "b");
        write(&temp, "src/app.js", "x");
        let ctx = context(&temp);

        let report = detect(&ctx, DetectOptions::default()).await.unwrap();
        assert_eq!(report.work_list, vec!["tests/a.spec.js", "tests/b.spec.ts"]);

        let saved = ctx.work_list().load().await.unwrap().unwrap();
        assert_eq!(saved, report.work_list);
        assert!(ctx.metadata_store().load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detect_clears_previous_failures() {
        let temp = TempDir::new().unwrap();
        write(&temp, "tests/a.spec.js", "a");
        let ctx = context(&temp);
        ctx.failed_list().save(&["tests/old.spec.js"]).await.unwrap();

        detect(&ctx, DetectOptions::default()).await.unwrap();
        assert!(ctx.failed_list().load().await.unwrap().is_none());
        assert!(ctx.failure_identifier().load_report().await.is_none());
    }

    #[tokio::test]
    async fn test_sync_makes_second_run_empty() {
        let temp = TempDir::new().unwrap();
        write(&temp, "tests/a.spec.js", "a");
        let ctx = context(&temp);
        let sync = DetectOptions {
            sync: true,
            ..Default::default()
        };

        assert_eq!(detect(&ctx, sync).await.unwrap().work_list.len(), 1);
        assert!(detect(&ctx, sync).await.unwrap().work_list.is_empty());

        write(&temp, "tests/a.spec.js", "a changed");
        let report = detect(&ctx, sync).await.unwrap();
        assert_eq!(report.changed, vec!["tests/a.spec.js"]);
    }

    #[tokio::test]
    async fn test_force_schedules_everything() {
        let temp = TempDir::new().unwrap();
        write(&temp, "tests/a.spec.js", "a");
        let ctx = context(&temp);
        let sync = DetectOptions {
            sync: true,
            ..Default::default()
        };
        detect(&ctx, sync).await.unwrap();

        let forced = DetectOptions {
            force: true,
            ..Default::default()
        };
        let report = detect(&ctx, forced).await.unwrap();
        assert_eq!(report.work_list, vec!["tests/a.spec.js"]);
    }
}
