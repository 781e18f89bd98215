//! Metadata Command
//!
//! `metadata update` records fingerprints for every scheduled file that was
//! documented, so the next detection skips it.
//!
//! A file counts as failed when it is on the failed list or when no batch
//! result documents it.

use std::collections::BTreeSet;

use chrono::Utc;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, emit};
use crate::constants::state::BATCH_GLOB;
use crate::detect::{DetectionMode, RecordOutcome, record_processed_except};
use crate::docs::load_batches;
use crate::failure::identify_failures;
use crate::types::{Result, ScribeError};

pub async fn update(ctx: &CommandContext) -> Result<RecordOutcome> {
    let work_list = ctx.work_list();
    let scheduled = work_list
        .load()
        .await?
        .ok_or_else(|| ScribeError::missing_input(work_list.locate()))?;

    let batches = load_batches(&ctx.batch_dir(), BATCH_GLOB).await?;
    let undocumented = identify_failures(DetectionMode::Incremental, &scheduled, &batches);
    let failed: Vec<String> = ctx
        .failed_list()
        .load_or_empty()
        .await?
        .into_iter()
        .chain(undocumented.failed_files)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    record_processed_except(
        ctx.project_root(),
        &ctx.metadata_store(),
        &scheduled,
        &failed,
        ctx.config.docs.provenance.as_deref(),
        Utc::now(),
    )
    .await
}

pub async fn run_update() -> Result<()> {
    let ctx = CommandContext::load()?;
    let outcome = update(&ctx).await?;

    let out = Output::new();
    out.section("Metadata update");
    out.row("Recorded", outcome.recorded.len());
    out.row("Failed", outcome.excluded.len());
    if !outcome.missing.is_empty() {
        out.row("Missing", outcome.missing.len());
        for path in &outcome.missing {
            out.item(path);
        }
    }

    emit("recorded", outcome.recorded.len());
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

    fn write_batch(ctx: &CommandContext, id: &str, files: &[&str]) {
        let entries: Vec<_> = files
            .iter()
            .map(|f| serde_json::json!({ "fileName": f, "markdown": "doc" }))
            .collect();
        std::fs::create_dir_all(ctx.batch_dir()).unwrap();
        std::fs::write(
            ctx.batch_dir().join(format!("{}.json", id)),
            serde_json::json!({ "entries": entries }).to_string(),
        )
        .unwrap();
    }

    async fn schedule(temp: &TempDir, ctx: &CommandContext, files: &[&str]) {
        std::fs::create_dir_all(temp.path().join("tests")).unwrap();
        for file in files {
            std::fs::write(temp.path().join(file), *file).unwrap();
        }
        ctx.work_list().save(files).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_skips_failed_files() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        schedule(&temp, &ctx, &["tests/a.spec.js", "tests/b.spec.js"]).await;
        write_batch(&ctx, "batch-1", &["tests/a.spec.js", "tests/b.spec.js"]);
        ctx.failed_list().save(&["tests/b.spec.js"]).await.unwrap();

        let outcome = update(&ctx).await.unwrap();
        assert_eq!(outcome.recorded, vec!["tests/a.spec.js"]);

        let records = ctx.metadata_store().load().await.unwrap();
        assert!(records.contains_key("tests/a.spec.js"));
        assert!(!records.contains_key("tests/b.spec.js"));
        assert_eq!(records["tests/a.spec.js"].provenance.as_deref(), Some("ai-docs"));
    }

    #[tokio::test]
    async fn test_update_skips_undocumented_files_without_failed_list() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        schedule(&temp, &ctx, &["tests/a.spec.js", "tests/b.spec.js"]).await;
        write_batch(&ctx, "batch-1", &["tests/a.spec.js"]);

        let outcome = update(&ctx).await.unwrap();
        assert_eq!(outcome.recorded, vec!["tests/a.spec.js"]);
        assert_eq!(outcome.excluded, vec!["tests/b.spec.js"]);

        let records = ctx.metadata_store().load().await.unwrap();
        assert!(!records.contains_key("tests/b.spec.js"));
    }

    #[tokio::test]
    async fn test_update_without_batches_records_nothing() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        schedule(&temp, &ctx, &["tests/a.spec.js"]).await;

        let outcome = update(&ctx).await.unwrap();
        assert!(outcome.recorded.is_empty());
        assert!(ctx.metadata_store().load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_requires_work_list() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.state.dir = temp.path().join(".testscribe");
        let ctx = CommandContext::with_config(config.clone(), config.state.dir.clone());
        assert!(update(&ctx).await.unwrap_err().is_usage());
    }
}
