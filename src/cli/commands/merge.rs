//! Merge Command
//!
//! Fold this run's batch results into the consolidated documentation.

use chrono::Utc;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, emit};
use crate::constants::state::BATCH_GLOB;
use crate::docs::{MergeOutcome, load_batches};
use crate::types::Result;

pub async fn merge(ctx: &CommandContext, dry_run: bool) -> Result<MergeOutcome> {
    let batches = load_batches(&ctx.batch_dir(), BATCH_GLOB).await?;
    let scheduled = ctx.work_list().load_or_empty().await?;
    let merger = ctx.merger();

    if dry_run {
        merger.plan(&batches, &scheduled, Utc::now()).await
    } else {
        merger.merge(&batches, &scheduled, Utc::now()).await
    }
}

pub async fn run(dry_run: bool, json: bool) -> Result<()> {
    let ctx = CommandContext::load()?;
    let outcome = merge(&ctx, dry_run).await?;
    let stats = &outcome.stats;

    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }

    let out = Output::new();
    out.section(if dry_run { "Merge (dry run)" } else { "Merge" });
    out.row("Kept", stats.kept.len());
    out.row("Updated", stats.updated.len());
    out.row("Added", stats.added.len());
    out.row("Retired", stats.retired.len());
    for key in &stats.retired {
        out.item(key);
    }
    out.row("Total", stats.total);
    if !stats.retired.is_empty() {
        out.warning("Retired entries were scheduled but produced no documentation");
    }
    if !dry_run {
        out.success(&format!(
            "Wrote {}",
            ctx.backend.locate(&ctx.config.state.docs)
        ));
    }

    emit("documented_entries", stats.total);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> CommandContext {
        let mut config = Config::default();
        config.state.dir = temp.path().join(".testscribe");
        CommandContext::with_config(config.clone(), config.state.dir.clone())
    }

    #[tokio::test]
    async fn test_merge_batches_into_documentation() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        std::fs::create_dir_all(ctx.batch_dir()).unwrap();
        std::fs::write(
            ctx.batch_dir().join("batch-1.json"),
            r#"{"entries":[{"fileName":"tests/b.spec.js","markdown":"bee","testName":"B"}]}"#,
        )
        .unwrap();
        std::fs::write(
            ctx.batch_dir().join("batch-2.json"),
            r#"[{"fileName":"tests/a.spec.js","markdown":"ay"}]"#,
        )
        .unwrap();

        let outcome = merge(&ctx, false).await.unwrap();
        assert_eq!(outcome.stats.added, vec!["a.spec.js", "b.spec.js"]);

        let docs = std::fs::read_to_string(ctx.state_dir.join("docs/TEST_DOCUMENTATION.md")).unwrap();
        assert!(docs.contains("## b.spec.js → B"));
        assert!(ctx.state_dir.join("docs/existing.md").exists());
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        merge(&ctx, true).await.unwrap();
        assert!(!ctx.state_dir.join("docs/TEST_DOCUMENTATION.md").exists());
    }
}
